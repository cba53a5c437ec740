//! Error taxonomy (spec §7). Only the "fatal" variants here actually abort a
//! run; package-local, symbol-local, and resolution-miss conditions are
//! handled inline at their call sites (logged via `tracing` and skipped),
//! per the spec's propagation rule.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("missing project root: {0}")]
    MissingProjectRoot(PathBuf),

    #[error("loader produced zero packages for {0}")]
    NoPackages(PathBuf),

    #[error("failed to emit element to output stream")]
    Emit(#[source] std::io::Error),

    #[error("failed to serialize element")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
