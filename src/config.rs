//! Indexer configuration: a TOML document with an embedded default (the
//! same `include_str!` mechanism the teacher's `configs.rs` used for its
//! language table), overridable by a user-supplied file and then by CLI
//! flags in that order.

use std::path::Path;

use serde::Deserialize;

use crate::moniker::StdlibConfig;

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Rewrite prefix for standard-library import paths (spec §4.4).
    pub stdlib_repo: String,
    /// Toolchain language version, used as the stdlib's synthetic
    /// dependency version (`go<language_version>`).
    pub language_version: String,
    /// Worker-pool size for the per-pass `rayon` parallelism (spec §5).
    /// `0` means "use all available cores".
    pub jobs: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default_config.toml is valid TOML")
    }
}

impl IndexerConfig {
    /// Loads configuration from `path`, falling back to the embedded
    /// default when `path` is `None`. Fields absent from a user file keep
    /// their default value (`#[serde(default)]`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn stdlib_config(&self) -> StdlibConfig {
        StdlibConfig {
            repo: self.stdlib_repo.clone(),
            language_version: self.language_version.clone(),
        }
    }

    /// Resolves `jobs` to a concrete thread count.
    pub fn worker_count(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let cfg = IndexerConfig::default();
        assert_eq!(cfg.stdlib_repo, "github.com/golang/go");
        assert_eq!(cfg.jobs, 0);
    }

    #[test]
    fn worker_count_falls_back_to_cpu_count_when_zero() {
        let cfg = IndexerConfig {
            jobs: 0,
            ..IndexerConfig::default()
        };
        assert!(cfg.worker_count() >= 1);
    }
}
