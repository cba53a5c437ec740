//! The single writer of the LSIF stream (spec §4.1).
//!
//! Identifiers are allocated inside the same critical section that writes
//! the line, so "every vertex precedes any edge that references it" holds
//! for free — no cross-worker ordering logic is needed (spec's Design
//! Notes, "Parallel emission with ordering guarantees").

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{IndexError, Result};
use crate::model::{Edge, Element, Entry, Id, Vertex};

/// Assigns ids, serializes, and counts emitted elements. `next_id` starts at
/// 1 and is strictly monotonic (invariant 6 of spec §8).
pub trait Emitter: Send + Sync {
    fn next_id(&self) -> Id;

    fn emit_vertex(&self, vertex: Vertex) -> Result<Id>;

    fn emit_edge(&self, edge: Edge) -> Result<Id>;

    /// Total number of elements emitted so far (vertices + edges).
    fn count(&self) -> u64;
}

/// Writes newline-delimited JSON to any `Write` sink, serializing under the
/// same lock that allocates the id — the emitter's exclusive-writer
/// contract from spec §5 ("the emitter serializes writes with an exclusive
/// lock, so concurrent writers block").
pub struct StreamEmitter<W: Write + Send> {
    next_id: AtomicU64,
    count: AtomicU64,
    writer: Mutex<W>,
}

impl<W: Write + Send> StreamEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            count: AtomicU64::new(0),
            writer: Mutex::new(writer),
        }
    }

    fn write_entry(&self, entry: Entry) -> Result<Id> {
        let id = entry.id;
        let line = serde_json::to_string(&entry).map_err(IndexError::Serialize)?;
        {
            let mut w = self.writer.lock();
            w.write_all(line.as_bytes()).map_err(IndexError::Emit)?;
            w.write_all(b"\n").map_err(IndexError::Emit)?;
        }
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}

impl<W: Write + Send> Emitter for StreamEmitter<W> {
    fn next_id(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn emit_vertex(&self, vertex: Vertex) -> Result<Id> {
        let id = self.next_id();
        self.write_entry(Entry {
            id,
            data: Element::Vertex(vertex),
        })
    }

    fn emit_edge(&self, edge: Edge) -> Result<Id> {
        let id = self.next_id();
        self.write_entry(Entry {
            id,
            data: Element::Edge(edge),
        })
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

/// In-memory emitter used by tests to assert on the emitted element
/// sequence without going through a writer.
#[cfg(any(test, feature = "test-support"))]
pub struct RecordingEmitter {
    next_id: AtomicU64,
    pub entries: Mutex<Vec<Entry>>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for RecordingEmitter {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Emitter for RecordingEmitter {
    fn next_id(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn emit_vertex(&self, vertex: Vertex) -> Result<Id> {
        let id = self.next_id();
        self.entries.lock().push(Entry {
            id,
            data: Element::Vertex(vertex),
        });
        Ok(id)
    }

    fn emit_edge(&self, edge: Edge) -> Result<Id> {
        let id = self.next_id();
        self.entries.lock().push(Entry {
            id,
            data: Element::Edge(edge),
        });
        Ok(id)
    }

    fn count(&self) -> u64 {
        self.entries.lock().len() as u64
    }
}
