//! The Indexer Driver (spec §4.5): runs the four passes over the loaded
//! packages in order, parallelizing within each pass across packages with
//! `rayon`, and enforces the emission ordering invariants of §4.1.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use url::Url;

use crate::emitter::Emitter;
use crate::error::{IndexError, Result};
use crate::loader::{Definition, Package, SourceFile, SymbolKind, Use};
use crate::model::{Edge, EventKind, EventScope, HoverContents, Id, MetaData, Moniker, MonikerKind,
    Project, ResultSet, Vertex};
use crate::moniker::MonikerEngine;
use crate::package_cache::PackageDataCache;
use crate::range::{ByteRange, LineIndex, Range};
use crate::symbol_table::{DefinitionRecord, SymbolTables};

/// A single top-level cancel signal that aborts outstanding work on pass
/// boundaries (spec §5). Timeouts are the caller's responsibility.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum DocState {
    Registered = 0,
    DefinitionsEmitted = 1,
    ReferencesEmitted = 2,
    Linked = 3,
    Ended = 4,
}

/// Per-document bookkeeping the driver owns; workers only ever touch it
/// through `&DocumentRecord` borrows keyed by path, never by holding the
/// object itself across a pass boundary (spec's Design Notes, "shared
/// ownership of documents and result-sets").
struct DocumentRecord {
    document_id: Id,
    line_index: LineIndex,
    /// Byte offset -> already-emitted range id, within this file. The
    /// single source of truth for invariant 2 ("at most one range vertex
    /// per (document, offset)") and for S6 (def/use sharing an offset).
    ranges_by_offset: DashMap<usize, Id>,
    definition_ranges: Mutex<Vec<Id>>,
    reference_ranges: Mutex<Vec<Id>>,
    state: AtomicU8,
}

impl DocumentRecord {
    fn new(document_id: Id, line_index: LineIndex) -> Self {
        Self {
            document_id,
            line_index,
            ranges_by_offset: DashMap::new(),
            definition_ranges: Mutex::new(Vec::new()),
            reference_ranges: Mutex::new(Vec::new()),
            state: AtomicU8::new(DocState::Registered as u8),
        }
    }

    /// Advances the state machine. Re-entering a prior state is forbidden
    /// (spec §4.5); in release builds this is simply a no-op past the
    /// expected transition, since multiple packages may race to link the
    /// same document.
    fn advance_to(&self, want: DocState) {
        let want = want as u8;
        let mut cur = self.state.load(Ordering::SeqCst);
        while cur < want {
            match self
                .state
                .compare_exchange(cur, want, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }
}

/// Orchestrates the full pipeline for one workspace. Owns no business logic
/// of its own beyond sequencing: every real decision is delegated to the
/// tables, cache, and moniker engine passed in at construction.
pub struct IndexerDriver<E: Emitter> {
    emitter: E,
    tables: SymbolTables,
    cache: PackageDataCache,
    monikers: MonikerEngine,
    documents: DashMap<PathBuf, Arc<DocumentRecord>>,
    local_version: String,
    cancel: CancelToken,
}

impl<E: Emitter> IndexerDriver<E> {
    pub fn new(
        emitter: E,
        tables: SymbolTables,
        cache: PackageDataCache,
        monikers: MonikerEngine,
        local_version: String,
        cancel: CancelToken,
    ) -> Self {
        Self {
            emitter,
            tables,
            cache,
            monikers,
            documents: DashMap::new(),
            local_version,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Unwraps the driver to recover its emitter, for callers (tests,
    /// alternate `main`s) that want to inspect or finalize it after a run.
    pub fn into_emitter(self) -> E {
        self.emitter
    }

    /// Runs metadata/project emission followed by the four passes. Fatal
    /// (spec §7) on the first emitter error or a loader that produced zero
    /// packages; everything else is handled inline per pass.
    pub fn run(&self, packages: &[Package], project_root: &Path) -> Result<()> {
        if packages.is_empty() {
            return self.emit_metadata_and_project(project_root).map(|_| ());
        }

        let project_id = self.emit_metadata_and_project(project_root)?;

        // Register package directories for the Package Data Cache before
        // any pass reads from it, so pass 2's hover lookups never race a
        // still-populating cache entry.
        for pkg in packages {
            let spans: Vec<_> = pkg
                .files
                .iter()
                .flat_map(|f| f.commented_spans.clone())
                .collect();
            let fields: Vec<_> = pkg
                .files
                .iter()
                .flat_map(|f| f.field_facts.clone())
                .collect();
            self.cache.register(&pkg.dir, &spans, &fields);
        }

        self.pass_documents(packages, project_id)?;
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        self.pass_definitions(packages)?;
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        self.pass_references(packages)?;
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        self.pass_link_up(project_id)?;
        Ok(())
    }

    fn emit_metadata_and_project(&self, project_root: &Path) -> Result<Id> {
        let root_url = Url::from_directory_path(project_root)
            .map_err(|_| IndexError::MissingProjectRoot(project_root.to_path_buf()))?;
        self.emitter.emit_vertex(Vertex::MetaData(MetaData {
            version: "0.4.3".to_string(),
            project_root: root_url,
            position_encoding: crate::model::Encoding::Utf16,
            tool_info: Some(Default::default()),
        }))?;
        self.emitter
            .emit_vertex(Vertex::Project(Project::default()))
    }

    /// Pass 1 — Documents. Every distinct path is registered exactly once:
    /// duplicate paths (e.g. in-package test compilations sharing a
    /// directory) are skipped (spec §4.5 Pass 1). `claimed_paths` makes the
    /// claim atomic — a path is reserved with a single `DashSet::insert`
    /// before anything is emitted, so two packages racing on the same path
    /// under `rayon` can never both pass the check and both emit a document
    /// vertex.
    fn pass_documents(&self, packages: &[Package], project_id: Id) -> Result<()> {
        let claimed_paths: dashmap::DashSet<PathBuf> = dashmap::DashSet::new();
        packages
            .par_iter()
            .flat_map(|pkg| pkg.files.par_iter())
            .try_for_each(|file: &SourceFile| -> Result<()> {
                if !claimed_paths.insert(file.path.clone()) {
                    return Ok(());
                }

                let uri = Url::from_file_path(&file.path)
                    .unwrap_or_else(|_| Url::parse("file:///unknown").unwrap());
                let document_id = self.emitter.emit_vertex(Vertex::Document(crate::model::Document {
                    uri,
                    language_id: "go".to_string(),
                }))?;
                self.emitter.emit_vertex(Vertex::Event(crate::model::Event {
                    kind: EventKind::Begin,
                    scope: EventScope::Document,
                    data: document_id,
                }))?;
                self.emitter
                    .emit_edge(Edge::contains(project_id, vec![document_id]))?;

                let record = Arc::new(DocumentRecord::new(document_id, LineIndex::new(&file.text)));
                self.documents.insert(file.path.clone(), record);
                Ok(())
            })
    }

    /// Pass 2 — Definitions.
    fn pass_definitions(&self, packages: &[Package]) -> Result<()> {
        packages.par_iter().try_for_each(|pkg| -> Result<()> {
            pkg.files.par_iter().try_for_each(|file| -> Result<()> {
                for def in &file.defs {
                    self.index_definition(pkg, file, def)?;
                }
                Ok(())
            })?;
            for file in &pkg.files {
                if let Some(record) = self.documents.get(&file.path) {
                    record.advance_to(DocState::DefinitionsEmitted);
                }
            }
            Ok(())
        })
    }

    fn index_definition(&self, pkg: &Package, file: &SourceFile, def: &Definition) -> Result<()> {
        let record = match self.documents.get(&file.path) {
            Some(r) => r.clone(),
            None => return Ok(()),
        };

        if self.tables.lookup(&def.hub_key).is_some() {
            debug_assert!(
                false,
                "duplicate definition key for {:?} in {:?}",
                def.name, file.path
            );
            return Ok(());
        }

        let range_id = self.ensure_range(&record, file, def.byte_range, def.quoted)?;

        let result_set_id = self.emitter.emit_vertex(Vertex::ResultSet(ResultSet::default()))?;
        self.emitter.emit_edge(Edge::next(range_id, result_set_id))?;

        let definition_result_id = self.emitter.emit_vertex(Vertex::DefinitionResult)?;
        self.emitter
            .emit_edge(Edge::definition(result_set_id, definition_result_id))?;
        self.emitter.emit_edge(Edge::item_of_definitions(
            definition_result_id,
            vec![range_id],
            record.document_id,
        ))?;

        let hover_result_id = match self.cache.hover_text(&pkg.dir, def.byte_range.start) {
            Some(text) => {
                let id = self.emitter.emit_vertex(Vertex::HoverResult {
                    result: HoverContents::plaintext(text),
                })?;
                self.emitter.emit_edge(Edge::hover(result_set_id, id))?;
                Some(id)
            }
            None => None,
        };

        self.tables.get_or_create(def.hub_key.clone(), || DefinitionRecord {
            document_id: record.document_id,
            range_id,
            result_set_id,
            definition_result_id,
            hover_result_id,
        });
        self.tables
            .add_definition(def.hub_key.clone(), result_set_id, record.document_id, range_id);
        record.definition_ranges.lock().push(range_id);

        if def.kind == SymbolKind::PackageName {
            if let Some(import_path) = &def.import_path {
                self.monikers.emit_import_moniker(
                    &self.emitter,
                    import_path,
                    &def.qualified_name,
                    result_set_id,
                )?;
            }
        } else if def.exported {
            let identifier = if def.kind == SymbolKind::Field {
                self.cache
                    .field_moniker(&pkg.dir, def.byte_range.start)
                    .unwrap_or_else(|| def.qualified_name.to_string())
            } else {
                def.qualified_name.to_string()
            };
            self.monikers.emit_export_moniker(
                &self.emitter,
                &identifier,
                result_set_id,
                &self.local_version,
            )?;
        }

        Ok(())
    }

    /// Pass 3 — References.
    fn pass_references(&self, packages: &[Package]) -> Result<()> {
        packages.par_iter().try_for_each(|pkg| -> Result<()> {
            pkg.files.par_iter().try_for_each(|file| -> Result<()> {
                for use_ in &file.uses {
                    self.index_reference(pkg, file, use_)?;
                }
                Ok(())
            })?;
            for file in &pkg.files {
                if let Some(record) = self.documents.get(&file.path) {
                    record.advance_to(DocState::ReferencesEmitted);
                }
            }
            Ok(())
        })
    }

    fn index_reference(&self, pkg: &Package, file: &SourceFile, use_: &Use) -> Result<()> {
        let record = match self.documents.get(&file.path) {
            Some(r) => r.clone(),
            None => return Ok(()),
        };

        if let Some(def_record) = self.tables.lookup(&use_.hub_key) {
            let range_id = self.ensure_range(&record, file, use_.byte_range, use_.quoted)?;
            self.emitter.emit_edge(Edge::next(range_id, def_record.result_set_id))?;
            self.tables.add_reference(
                use_.hub_key.clone(),
                def_record.result_set_id,
                record.document_id,
                range_id,
            );
            record.reference_ranges.lock().push(range_id);
            return Ok(());
        }

        if let Some(import_path) = &use_.external_package {
            let range_id = self.ensure_range(&record, file, use_.byte_range, use_.quoted)?;
            record.reference_ranges.lock().push(range_id);

            if let Some(comment) = self.cache.enclosing_comment(&pkg.dir, use_.byte_range.start) {
                let hover_id = self.emitter.emit_vertex(Vertex::HoverResult {
                    result: HoverContents::plaintext(comment),
                })?;
                self.emitter.emit_edge(Edge::hover(range_id, hover_id))?;
            }

            let resolved = self.monikers.resolve_import(import_path);
            let (canonical, version) = match resolved {
                Some(it) => it,
                None => {
                    tracing::warn!(import_path, "unresolved external reference");
                    return Ok(());
                }
            };
            let pkg_info_id = self.monikers.ensure_package_information(&self.emitter, &canonical, &version)?;
            let identifier = format!("{}:{}", canonical, use_.name);
            let moniker_id =
                self.monikers
                    .ensure_moniker(&self.emitter, MonikerKind::Import, &identifier, pkg_info_id)?;
            self.emitter.emit_edge(Edge::moniker(range_id, moniker_id))?;

            let reference_result_id = self.emitter.emit_vertex(Vertex::ReferenceResult)?;
            self.emitter
                .emit_edge(Edge::references(range_id, reference_result_id))?;
            self.emitter.emit_edge(Edge::item_of_references(
                reference_result_id,
                vec![range_id],
                record.document_id,
            ))?;
            return Ok(());
        }

        tracing::debug!(name = %use_.name, ?file.path, "unresolved use; leaving unlinked");
        Ok(())
    }

    /// Pass 4 — Link up. Drains the reference-aggregation table exactly
    /// once (spec invariant: "post-link tables are empty"), then emits
    /// each document's `contains` edge, end-events for all documents, and
    /// finally the project's own end-event.
    fn pass_link_up(&self, project_id: Id) -> Result<()> {
        let drained = self.tables.drain_references();
        for (_key, record) in drained {
            if record.definitions_by_document.is_empty() && record.references_by_document.is_empty() {
                continue;
            }
            let reference_result_id = self.emitter.emit_vertex(Vertex::ReferenceResult)?;
            self.emitter
                .emit_edge(Edge::references(record.hub_id, reference_result_id))?;

            for (document_id, ranges) in &record.definitions_by_document {
                self.emitter.emit_edge(Edge::item_of_definitions(
                    reference_result_id,
                    ranges.clone(),
                    *document_id,
                ))?;
            }
            for (document_id, ranges) in &record.references_by_document {
                self.emitter.emit_edge(Edge::item_of_references(
                    reference_result_id,
                    ranges.clone(),
                    *document_id,
                ))?;
            }
        }

        for entry in self.documents.iter() {
            let record = entry.value();
            record.advance_to(DocState::Linked);
            let mut all_ranges = record.definition_ranges.lock().clone();
            all_ranges.extend(record.reference_ranges.lock().iter().copied());
            all_ranges.sort_unstable();
            all_ranges.dedup();
            if !all_ranges.is_empty() {
                self.emitter
                    .emit_edge(Edge::contains(record.document_id, all_ranges))?;
            }
        }

        for entry in self.documents.iter() {
            let record = entry.value();
            self.emitter.emit_vertex(Vertex::Event(crate::model::Event {
                kind: EventKind::End,
                scope: EventScope::Document,
                data: record.document_id,
            }))?;
            record.advance_to(DocState::Ended);
        }

        self.emitter.emit_vertex(Vertex::Event(crate::model::Event {
            kind: EventKind::End,
            scope: EventScope::Project,
            data: project_id,
        }))?;

        Ok(())
    }

    /// Emits (or reuses) the range vertex at `byte_range` within `file`'s
    /// document, shrinking the coordinates by one code point on each side
    /// when the underlying identifier is a quoted string literal (spec §4.5
    /// pass 2 step 1). Invariant 2: at most one range per (document,
    /// offset) — the `DashMap::entry` below is the single choke point.
    fn ensure_range(
        &self,
        record: &DocumentRecord,
        file: &SourceFile,
        byte_range: ByteRange,
        quoted: bool,
    ) -> Result<Id> {
        if let Some(existing) = record.ranges_by_offset.get(&byte_range.start) {
            return Ok(*existing);
        }

        let mut coords: Range = record.line_index.range(&file.text, byte_range);
        if quoted {
            coords = coords.shrink_quotes();
        }

        let id = self
            .emitter
            .emit_vertex(Vertex::Range(coords.into()))?;
        record.ranges_by_offset.entry(byte_range.start).or_insert(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::DependencyInfo;
    use crate::emitter::RecordingEmitter;
    use crate::model::{Element, Entry};
    use crate::moniker::StdlibConfig;
    use std::collections::HashMap;
    use std::sync::Arc as StdArc;
    use tempfile::tempdir;

    fn engine(deps: HashMap<String, DependencyInfo>, local_module: &str) -> MonikerEngine {
        MonikerEngine::new(deps, StdlibConfig::default(), local_module.to_string())
    }

    fn driver(local_module: &str, deps: HashMap<String, DependencyInfo>) -> IndexerDriver<RecordingEmitter> {
        IndexerDriver::new(
            RecordingEmitter::default(),
            SymbolTables::new(),
            PackageDataCache::new(),
            engine(deps, local_module),
            "v0.0.0".to_string(),
            CancelToken::new(),
        )
    }

    fn package_from_source(dir: &Path, relative: &str, src: &str) -> Package {
        let path = dir.join(relative);
        let file_arc = StdArc::new(path.clone());
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(tree_sitter_go::language()).unwrap();
        let tree = parser.parse(src, None).unwrap();
        let analysis = crate::loader::analyze_file_for_tests(file_arc, src, &tree);
        Package {
            import_path: "a".to_string(),
            dir: dir.to_path_buf(),
            files: vec![SourceFile {
                path,
                text: src.to_string(),
                defs: analysis.0,
                uses: analysis.1,
                commented_spans: analysis.2,
                field_facts: analysis.3,
            }],
        }
    }

    #[test]
    fn zero_packages_emits_only_metadata_and_project() {
        let dir = tempdir().unwrap();
        let d = driver("a", HashMap::new());
        d.run(&[], dir.path()).unwrap();
        let entries = d.emitter.entries.lock();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0].data, Element::Vertex(Vertex::MetaData(_))));
        assert!(matches!(entries[1].data, Element::Vertex(Vertex::Project(_))));
    }

    #[test]
    fn every_edge_endpoint_was_emitted_earlier() {
        let dir = tempdir().unwrap();
        let src = "package a\n\ntype T struct {\n\tX int\n}\n";
        let pkg = package_from_source(dir.path(), "a.go", src);
        let d = driver("a", HashMap::new());
        d.run(&[pkg], dir.path()).unwrap();

        let entries = d.emitter.entries.lock();
        let seen: std::collections::HashSet<Id> = entries.iter().map(|e: &Entry| e.id).collect();
        let mut emitted_so_far = std::collections::HashSet::new();
        for entry in entries.iter() {
            if let Element::Edge(edge) = &entry.data {
                let (out_v, in_vs): (Id, Vec<Id>) = match edge {
                    Edge::Contains(d) => (d.out_v, d.in_vs.clone()),
                    Edge::Next(d) | Edge::Moniker(d) | Edge::NextMoniker(d)
                    | Edge::PackageInformation(d) | Edge::Definition(d)
                    | Edge::References(d) | Edge::Hover(d) => (d.out_v, vec![d.in_v]),
                    Edge::Item(item) => (item.edge_data.out_v, item.edge_data.in_vs.clone()),
                };
                assert!(emitted_so_far.contains(&out_v) || seen.contains(&out_v));
                for in_v in in_vs {
                    assert!(emitted_so_far.contains(&in_v) || seen.contains(&in_v));
                }
            }
            emitted_so_far.insert(entry.id);
        }
    }

    #[test]
    fn struct_field_gets_distinct_hub_and_qualified_export_moniker() {
        let dir = tempdir().unwrap();
        let src = "package a\n\ntype T struct {\n\tX int\n}\n";
        let pkg = package_from_source(dir.path(), "a.go", src);
        let d = driver("a", HashMap::new());
        d.run(&[pkg], dir.path()).unwrap();

        let entries = d.emitter.entries.lock();
        let monikers: Vec<&Moniker> = entries
            .iter()
            .filter_map(|e| match &e.data {
                Element::Vertex(Vertex::Moniker(m)) => Some(m),
                _ => None,
            })
            .collect();
        assert!(monikers.iter().any(|m| m.identifier == "a:T"));
        assert!(monikers.iter().any(|m| m.identifier == "a:T.X"));
    }

    #[test]
    fn duplicate_offset_emits_exactly_one_range() {
        let d = driver("a", HashMap::new());
        let record = DocumentRecord::new(1, LineIndex::new("xy"));
        let r1 = d
            .ensure_range(
                &record,
                &SourceFile {
                    path: PathBuf::from("a.go"),
                    text: "xy".to_string(),
                    defs: Vec::new(),
                    uses: Vec::new(),
                    commented_spans: Vec::new(),
                    field_facts: Vec::new(),
                },
                ByteRange::new(0, 1),
                false,
            )
            .unwrap();
        let r2 = d
            .ensure_range(
                &record,
                &SourceFile {
                    path: PathBuf::from("a.go"),
                    text: "xy".to_string(),
                    defs: Vec::new(),
                    uses: Vec::new(),
                    commented_spans: Vec::new(),
                    field_facts: Vec::new(),
                },
                ByteRange::new(0, 1),
                false,
            )
            .unwrap();
        assert_eq!(r1, r2);
        assert_eq!(d.emitter.count(), 1);
    }

    #[test]
    fn link_up_emits_a_document_end_event_and_a_project_end_event() {
        let dir = tempdir().unwrap();
        let src = "package a\n\nfunc Foo() {}\n";
        let pkg = package_from_source(dir.path(), "a.go", src);
        let d = driver("a", HashMap::new());
        d.run(&[pkg], dir.path()).unwrap();

        let entries = d.emitter.entries.lock();
        let events: Vec<&crate::model::Event> = entries
            .iter()
            .filter_map(|e| match &e.data {
                Element::Vertex(Vertex::Event(ev)) => Some(ev),
                _ => None,
            })
            .collect();
        assert_eq!(
            events
                .iter()
                .filter(|e| e.kind == EventKind::End && e.scope == EventScope::Document)
                .count(),
            1
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| e.kind == EventKind::End && e.scope == EventScope::Project)
                .count(),
            1,
            "pass 4 must end the project after ending its documents"
        );
    }

    #[test]
    fn two_packages_sharing_a_path_emit_exactly_one_document() {
        // Simulates the in-package test-compilation scenario (spec §4.5
        // Pass 1): two `Package`s whose file lists both contain the same
        // path must still produce exactly one `document` vertex for it.
        let dir = tempdir().unwrap();
        let src = "package a\n\nfunc Foo() {}\n";
        let pkg_a = package_from_source(dir.path(), "a.go", src);
        let pkg_b = package_from_source(dir.path(), "a.go", src);
        let d = driver("a", HashMap::new());
        d.run(&[pkg_a, pkg_b], dir.path()).unwrap();

        let entries = d.emitter.entries.lock();
        let documents = entries
            .iter()
            .filter(|e| matches!(e.data, Element::Vertex(Vertex::Document(_))))
            .count();
        assert_eq!(documents, 1);
    }
}
