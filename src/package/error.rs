//! Errors from reading per-unit configuration files.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Unterminated frontmatter in {path}")]
    UnclosedFrontmatter { path: PathBuf },
}
