//! Error types for ecosystem and workspace discovery.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from discovery operations.
///
/// Only [`DiscoveryError::NoEcosystem`] aborts a run; the other variants are
/// logged and the offending ecosystem or pattern is skipped.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error(
        "No ecosystem encloses {start}: expected an ancestor with a package.json \"workspaces\" field or a Cargo.toml [workspace] table"
    )]
    NoEcosystem { start: PathBuf },

    #[error("Ecosystem '{name}' could not be resolved (looked in {looked})")]
    UnknownEcosystem { name: String, looked: PathBuf },

    #[error("Invalid workspace manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Invalid workspace pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
