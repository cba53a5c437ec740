//! Symbol Tables (spec §4.3): the canonical map from semantic keys to
//! definition records, plus per-range reference aggregation consumed by the
//! link-up pass.
//!
//! `DashMap` gives per-shard locking rather than one global lock — the
//! "fine-grained per-key synchronization" the spec's Design Notes ask for —
//! and composes with the emitter → tables → cache lock ordering of §5
//! because no method here ever calls into the emitter or the package cache
//! while holding an entry.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::loader::HubKey;
use crate::model::Id;

/// One symbol's hub plus the bookkeeping the link-up pass needs.
#[derive(Debug, Clone)]
pub struct DefinitionRecord {
    pub document_id: Id,
    pub range_id: Id,
    pub result_set_id: Id,
    pub definition_result_id: Id,
    pub hover_result_id: Option<Id>,
}

/// Reference record (spec §3): keyed by the same `HubKey` as its
/// definition, aggregating definition and reference ranges grouped by
/// document. Consumed exactly once by the link-up pass.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRecord {
    pub hub_id: Id,
    /// Document id -> definition range ids contained in that document.
    pub definitions_by_document: HashMap<Id, Vec<Id>>,
    /// Document id -> reference range ids contained in that document.
    pub references_by_document: HashMap<Id, Vec<Id>>,
}

/// Process-wide symbol tables. A single `DashMap<HubKey, _>` serves all of
/// spec §4.3's per-kind tables, since `HubKey` is already the discriminated
/// union of "by position" / "by qualified name" / "by type string" the spec
/// describes — the four listed tables are the same map viewed through
/// different key constructors.
#[derive(Default)]
pub struct SymbolTables {
    definitions: DashMap<HubKey, DefinitionRecord>,
    references: DashMap<HubKey, ReferenceRecord>,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a definition record for `key`, or returns the existing one.
    /// A second distinct definition arriving under the same key is a
    /// programming error (spec: "Duplicate keys are a programming error and
    /// fail fatally in debug builds; in release builds the first writer
    /// wins").
    pub fn get_or_create(
        &self,
        key: HubKey,
        make: impl FnOnce() -> DefinitionRecord,
    ) -> DefinitionRecord {
        if let Some(existing) = self.definitions.get(&key) {
            return existing.clone();
        }
        self.definitions.entry(key).or_insert_with(make).clone()
    }

    pub fn lookup(&self, key: &HubKey) -> Option<DefinitionRecord> {
        self.definitions.get(key).map(|r| r.clone())
    }

    pub fn add_definition(&self, key: HubKey, hub_id: Id, document_id: Id, range_id: Id) {
        let mut entry = self.references.entry(key).or_default();
        entry.hub_id = hub_id;
        entry
            .definitions_by_document
            .entry(document_id)
            .or_default()
            .push(range_id);
    }

    pub fn add_reference(&self, key: HubKey, hub_id: Id, document_id: Id, range_id: Id) {
        let mut entry = self.references.entry(key).or_default();
        entry.hub_id = hub_id;
        entry
            .references_by_document
            .entry(document_id)
            .or_default()
            .push(range_id);
    }

    /// Drains every reference record. Called exactly once by the link-up
    /// pass; afterward the table is empty (testable property in spec §8:
    /// "post-link tables are empty").
    pub fn drain_references(&self) -> Vec<(HubKey, ReferenceRecord)> {
        let keys: Vec<HubKey> = self.references.iter().map(|e| e.key().clone()).collect();
        keys.into_iter()
            .filter_map(|k| self.references.remove(&k))
            .collect()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FileOffset;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn key(offset: usize) -> HubKey {
        HubKey::Position(FileOffset {
            file: Arc::new(PathBuf::from("a.go")),
            offset,
        })
    }

    #[test]
    fn get_or_create_returns_same_record_for_same_key() {
        let tables = SymbolTables::new();
        let r1 = tables.get_or_create(key(1), || DefinitionRecord {
            document_id: 1,
            range_id: 2,
            result_set_id: 3,
            definition_result_id: 4,
            hover_result_id: None,
        });
        let r2 = tables.get_or_create(key(1), || DefinitionRecord {
            document_id: 99,
            range_id: 99,
            result_set_id: 99,
            definition_result_id: 99,
            hover_result_id: None,
        });
        assert_eq!(r1.result_set_id, r2.result_set_id);
        assert_eq!(r2.result_set_id, 3);
    }

    #[test]
    fn drain_references_empties_the_table() {
        let tables = SymbolTables::new();
        tables.add_definition(key(1), 10, 1, 2);
        tables.add_reference(key(1), 10, 1, 3);
        assert_eq!(tables.reference_count(), 1);
        let drained = tables.drain_references();
        assert_eq!(drained.len(), 1);
        assert_eq!(tables.reference_count(), 0);
    }
}
