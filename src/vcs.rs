//! The "Version-control probe" external collaborator (spec §6): repository
//! root, remote URL, and inferred module version (exact tag at HEAD, else
//! `<nearest-tag>-<12-hex-of-HEAD>`).

use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsInfo {
    pub repo_root: PathBuf,
    pub remote_url: Option<String>,
    pub version: String,
}

pub trait VcsProbe: Send + Sync {
    fn probe(&self, project_root: &Path) -> Result<Option<VcsInfo>>;
}

/// Probes a git repository with `gix`. Returns `Ok(None)` rather than an
/// error when `project_root` isn't inside a git work tree — the driver
/// treats that as "no VCS info", not a fatal condition.
pub struct GitProbe;

impl GitProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GitProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsProbe for GitProbe {
    fn probe(&self, project_root: &Path) -> Result<Option<VcsInfo>> {
        let repo = match gix::discover(project_root) {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(%err, "no git repository found; module version degraded");
                return Ok(None);
            }
        };

        let repo_root = repo
            .work_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_root.to_path_buf());

        let remote_url = repo
            .find_default_remote(gix::remote::Direction::Fetch)
            .and_then(std::result::Result::ok)
            .and_then(|remote| remote.url(gix::remote::Direction::Fetch).map(|u| u.to_bstring()))
            .map(|u| u.to_string());

        let head_id = repo
            .head_id()
            .map(|id| id.to_string())
            .unwrap_or_default();

        let version = describe_version(&repo, &head_id);

        Ok(Some(VcsInfo {
            repo_root,
            remote_url,
            version,
        }))
    }
}

/// Exact tag at HEAD when one exists, else `<nearest-tag>-<12-hex-of-HEAD>`,
/// else just the 12-hex prefix of HEAD when there are no tags at all.
fn describe_version(repo: &gix::Repository, head_id: &str) -> String {
    let short = short_hash(head_id);
    let tags = match repo.references().and_then(|p| p.tags()) {
        Ok(t) => t,
        Err(_) => return short,
    };

    let mut exact_match = None;
    let mut any_tag = None;
    for tag in tags.filter_map(std::result::Result::ok) {
        let name = tag.name().shorten().to_string();
        any_tag.get_or_insert_with(|| name.clone());
        if let Ok(target) = tag.id().object() {
            if target.id.to_string() == head_id {
                exact_match = Some(name);
                break;
            }
        }
    }

    match (exact_match, any_tag) {
        (Some(tag), _) => tag,
        (None, Some(tag)) => format!("{}-{}", tag, short),
        (None, None) => short,
    }
}

fn short_hash(full: &str) -> String {
    full.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_truncates_to_twelve_hex_chars() {
        let full = "abcdef0123456789";
        assert_eq!(short_hash(full), "abcdef012345");
    }
}
