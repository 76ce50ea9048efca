//! Error types for aggregation.

use std::path::PathBuf;
use thiserror::Error;

use super::generator::GenerateError;
use crate::manifest::ManifestError;
use crate::package::PackageConfigError;

/// Errors from building units into the output tree.
///
/// Everything except [`AggregateError::Setup`] is a unit failure: logged,
/// the unit skipped, the run continued.
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Cannot prepare output directory {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] PackageConfigError),

    #[error("Refusing {field} '{value}': {reason}")]
    UnsafePath {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Section '{section}' source {path} is missing")]
    MissingSource { section: String, path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl AggregateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type AggregateResult<T> = Result<T, AggregateError>;
