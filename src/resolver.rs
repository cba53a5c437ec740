//! The "Module resolver" external collaborator (spec §6): given the project
//! root and a remote URL, returns the canonical module identity usable as an
//! export-moniker prefix (spec §4.4: symbol monikers are
//! `"<canonical-package>:<symbol-id>"`).

use std::path::Path;

use crate::error::Result;

pub trait ModuleResolver: Send + Sync {
    /// Returns the canonical module path for `project_root`, preferring
    /// `remote_url` (e.g. when it names a fork) when present.
    fn resolve(&self, project_root: &Path, remote_url: Option<&str>) -> Result<String>;
}

/// Reads the `module` directive out of `go.mod`. When a remote URL is
/// available and differs from the declared module path's host, the remote
/// wins — this is the glossary's "Canonical package: ... possibly rewritten
/// to a forked repository's URL" case.
pub struct GoModResolver;

impl GoModResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoModResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleResolver for GoModResolver {
    fn resolve(&self, project_root: &Path, remote_url: Option<&str>) -> Result<String> {
        let go_mod = project_root.join("go.mod");
        let declared = std::fs::read_to_string(&go_mod)
            .ok()
            .and_then(|text| module_directive(&text));

        match (remote_url, declared) {
            (Some(remote), Some(decl)) if !remote.is_empty() && remote != decl => {
                Ok(normalize_remote(remote))
            }
            (_, Some(decl)) => Ok(decl),
            (Some(remote), None) => Ok(normalize_remote(remote)),
            (None, None) => Ok(project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string())),
        }
    }
}

fn module_directive(go_mod_text: &str) -> Option<String> {
    for line in go_mod_text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("module ") {
            return Some(rest.trim().to_string());
        }
    }
    None
}

fn normalize_remote(remote: &str) -> String {
    remote
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("git@")
        .trim_end_matches(".git")
        .replace(':', "/")
        .to_string()
}
