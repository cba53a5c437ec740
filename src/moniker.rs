//! The Moniker Engine (spec §4.4): resolves a symbol's package-qualified
//! identity and emits the `packageInformation`/`moniker` vertices and their
//! linking edges idempotently.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::deps::DependencyInfo;
use crate::emitter::Emitter;
use crate::error::Result;
use crate::model::{Edge, Id, Moniker, MonikerKind, PackageInformation, Vertex};
use crate::stdlib_names::is_stdlib;

/// `<stdlib-repo>/std/<path>` rewrite target for standard-library packages
/// (spec §4.4), and the synthetic version derived from the toolchain's
/// declared language version.
pub struct StdlibConfig {
    pub repo: String,
    pub language_version: String,
}

impl Default for StdlibConfig {
    fn default() -> Self {
        Self {
            repo: "github.com/golang/go".to_string(),
            language_version: "1.21".to_string(),
        }
    }
}

pub struct MonikerEngine {
    dependencies: HashMap<String, DependencyInfo>,
    stdlib: StdlibConfig,
    local_module: String,
    package_info_ids: DashMap<(String, String), Id>,
    moniker_ids: DashMap<(MonikerKind, String), Id>,
}

impl MonikerEngine {
    pub fn new(
        dependencies: HashMap<String, DependencyInfo>,
        stdlib: StdlibConfig,
        local_module: String,
    ) -> Self {
        Self {
            dependencies,
            stdlib,
            local_module,
            package_info_ids: DashMap::new(),
            moniker_ids: DashMap::new(),
        }
    }

    /// Resolves an import path to its canonical (package-name, version),
    /// walking prefixes from longest to shortest (spec §4.4) so nested
    /// packages whose enclosing module is what the manifest lists still
    /// resolve. Returns `None` on a resolution miss (spec §7): the import
    /// moniker is then omitted and a warning logged by the caller.
    pub fn resolve_import(&self, import_path: &str) -> Option<(String, String)> {
        if is_stdlib(import_path) {
            return Some((
                format!("{}/std/{}", self.stdlib.repo, import_path),
                format!("go{}", self.stdlib.language_version),
            ));
        }

        let segments: Vec<&str> = import_path.split('/').collect();
        for len in (1..=segments.len()).rev() {
            let prefix = segments[..len].join("/");
            if let Some(info) = self.dependencies.get(&prefix) {
                let suffix = &import_path[prefix.len()..];
                return Some((
                    format!("{}{}", info.canonical_name, suffix),
                    info.version.clone(),
                ));
            }
        }
        None
    }

    pub fn local_package_name(&self) -> &str {
        &self.local_module
    }

    /// Emits the `packageInformation` vertex for (name, version) at most
    /// once, returning its id on every call (idempotent by spec §4.4).
    pub fn ensure_package_information<E: Emitter>(
        &self,
        emitter: &E,
        name: &str,
        version: &str,
    ) -> Result<Id> {
        let key = (name.to_string(), version.to_string());
        if let Some(id) = self.package_info_ids.get(&key) {
            return Ok(*id);
        }
        let id = emitter.emit_vertex(Vertex::PackageInformation(PackageInformation::gomod(
            name.to_string(),
            version.to_string(),
        )))?;
        self.package_info_ids.entry(key).or_insert(id);
        Ok(id)
    }

    /// Emits a `moniker` vertex for (kind, identifier) at most once and
    /// binds it to `package_info_id`, returning the moniker vertex id.
    pub fn ensure_moniker<E: Emitter>(
        &self,
        emitter: &E,
        kind: MonikerKind,
        identifier: &str,
        package_info_id: Id,
    ) -> Result<Id> {
        let key = (kind, identifier.to_string());
        if let Some(id) = self.moniker_ids.get(&key) {
            return Ok(*id);
        }
        let id = emitter.emit_vertex(Vertex::Moniker(Moniker::gomod(kind, identifier.to_string())))?;
        emitter.emit_edge(Edge::package_information(id, package_info_id))?;
        self.moniker_ids.entry(key).or_insert(id);
        Ok(id)
    }

    /// Emits an import moniker for a symbol used from `import_path`,
    /// attaching it to `hub_id` via `nextMoniker`. Returns `None` on a
    /// resolution miss.
    pub fn emit_import_moniker<E: Emitter>(
        &self,
        emitter: &E,
        import_path: &str,
        symbol_id: &str,
        hub_id: Id,
    ) -> Result<Option<Id>> {
        let (canonical, version) = match self.resolve_import(import_path) {
            Some(it) => it,
            None => {
                tracing::warn!(import_path, "import moniker resolution miss");
                return Ok(None);
            }
        };
        let pkg_info_id = self.ensure_package_information(emitter, &canonical, &version)?;
        let identifier = format!("{}:{}", canonical, symbol_id);
        let moniker_id = self.ensure_moniker(emitter, MonikerKind::Import, &identifier, pkg_info_id)?;
        emitter.emit_edge(Edge::next_moniker(hub_id, moniker_id))?;
        Ok(Some(moniker_id))
    }

    /// Emits an export moniker for a locally-defined exported symbol.
    pub fn emit_export_moniker<E: Emitter>(
        &self,
        emitter: &E,
        symbol_id: &str,
        hub_id: Id,
        local_version: &str,
    ) -> Result<Id> {
        let identifier = format!("{}:{}", self.local_module, symbol_id);
        let pkg_info_id =
            self.ensure_package_information(emitter, &self.local_module, local_version)?;
        let moniker_id = self.ensure_moniker(emitter, MonikerKind::Export, &identifier, pkg_info_id)?;
        emitter.emit_edge(Edge::next_moniker(hub_id, moniker_id))?;
        Ok(moniker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(deps: &[(&str, &str, &str)]) -> MonikerEngine {
        let mut map = HashMap::new();
        for (path, name, version) in deps {
            map.insert(
                path.to_string(),
                DependencyInfo {
                    canonical_name: name.to_string(),
                    version: version.to_string(),
                },
            );
        }
        MonikerEngine::new(map, StdlibConfig::default(), "a".to_string())
    }

    #[test]
    fn resolves_nested_package_via_longest_prefix() {
        let engine = engine_with(&[("github.com/org/lib", "github.com/org/lib", "v1.2.3")]);
        let (canonical, version) = engine.resolve_import("github.com/org/lib/x").unwrap();
        assert_eq!(canonical, "github.com/org/lib/x");
        assert_eq!(version, "v1.2.3");
    }

    #[test]
    fn stdlib_packages_are_rewritten() {
        let engine = engine_with(&[]);
        let (canonical, version) = engine.resolve_import("fmt").unwrap();
        assert!(canonical.starts_with("github.com/golang/go/std/fmt"));
        assert_eq!(version, "go1.21");
    }

    #[test]
    fn unknown_dependency_is_a_resolution_miss() {
        let engine = engine_with(&[]);
        assert!(engine.resolve_import("foo/bar").is_none());
    }
}
