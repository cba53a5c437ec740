//! The "Dependency enumerator" external collaborator (spec §6): returns a
//! map from import path to (canonical-name, version), honoring `replace`
//! directives. The default implementation reads `go.mod` directly rather
//! than shelling out to the toolchain, which keeps the indexer runnable
//! without a Go installation.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyInfo {
    pub canonical_name: String,
    pub version: String,
}

pub trait DependencyEnumerator: Send + Sync {
    fn dependencies(&self, project_root: &Path) -> Result<HashMap<String, DependencyInfo>>;
}

/// Parses `go.mod`'s `require` and `replace` directives.
pub struct GoModEnumerator;

impl GoModEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoModEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyEnumerator for GoModEnumerator {
    fn dependencies(&self, project_root: &Path) -> Result<HashMap<String, DependencyInfo>> {
        let path = project_root.join("go.mod");
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(?path, %err, "no go.mod found; dependency monikers degraded");
                return Ok(HashMap::new());
            }
        };
        Ok(parse_go_mod(&text))
    }
}

/// Parses the subset of `go.mod` syntax this indexer needs: single-line and
/// block `require (...)`/`replace (...)` directives. `replace` entries
/// override `require` entries for the same module path, matching Go's own
/// resolution rule ("honoring replace directives", spec §4.4).
fn parse_go_mod(text: &str) -> HashMap<String, DependencyInfo> {
    let mut requires: HashMap<String, String> = HashMap::new();
    let mut replaces: HashMap<String, (String, String)> = HashMap::new();

    let mut in_require_block = false;
    let mut in_replace_block = false;

    for raw_line in text.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("require (") {
            in_require_block = true;
            continue;
        }
        if line.starts_with("replace (") {
            in_replace_block = true;
            continue;
        }
        if line == ")" {
            in_require_block = false;
            in_replace_block = false;
            continue;
        }

        if in_require_block {
            parse_require_line(line, &mut requires);
        } else if let Some(rest) = line.strip_prefix("require ") {
            parse_require_line(rest, &mut requires);
        } else if in_replace_block {
            parse_replace_line(line, &mut replaces);
        } else if let Some(rest) = line.strip_prefix("replace ") {
            parse_replace_line(rest, &mut replaces);
        }
    }

    let mut deps = HashMap::new();
    for (path, version) in requires {
        deps.insert(
            path.clone(),
            DependencyInfo {
                canonical_name: path,
                version,
            },
        );
    }
    for (path, (target, version)) in replaces {
        deps.insert(
            path,
            DependencyInfo {
                canonical_name: target,
                version,
            },
        );
    }
    deps
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_require_line(line: &str, out: &mut HashMap<String, String>) {
    let mut parts = line.split_whitespace();
    if let (Some(path), Some(version)) = (parts.next(), parts.next()) {
        out.insert(path.to_string(), version.to_string());
    }
}

fn parse_replace_line(line: &str, out: &mut HashMap<String, (String, String)>) {
    let (lhs, rhs) = match line.split_once("=>") {
        Some(parts) => parts,
        None => return,
    };
    let from_path = lhs.split_whitespace().next().unwrap_or("").to_string();
    let mut rhs_parts = rhs.split_whitespace();
    if let (Some(target), Some(version)) = (rhs_parts.next(), rhs_parts.next()) {
        out.insert(from_path, (target.to_string(), version.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line_requires() {
        let text = "module example.com/m\n\ngo 1.21\n\nrequire github.com/org/lib v1.2.3\n";
        let deps = parse_go_mod(text);
        assert_eq!(
            deps.get("github.com/org/lib").unwrap().version,
            "v1.2.3"
        );
    }

    #[test]
    fn parses_block_requires() {
        let text = "module m\n\nrequire (\n\tgithub.com/a/a v1.0.0\n\tgithub.com/b/b v2.0.0 // indirect\n)\n";
        let deps = parse_go_mod(text);
        assert_eq!(deps.get("github.com/a/a").unwrap().version, "v1.0.0");
        assert_eq!(deps.get("github.com/b/b").unwrap().version, "v2.0.0");
    }

    #[test]
    fn replace_directive_overrides_require() {
        let text = concat!(
            "module m\n",
            "require github.com/org/lib v1.0.0\n",
            "replace github.com/org/lib => github.com/fork/lib v1.0.0-patched\n",
        );
        let deps = parse_go_mod(text);
        let dep = deps.get("github.com/org/lib").unwrap();
        assert_eq!(dep.canonical_name, "github.com/fork/lib");
        assert_eq!(dep.version, "v1.0.0-patched");
    }
}
