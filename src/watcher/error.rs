//! Error types for the watch engine.

use std::path::PathBuf;
use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::manifest::ManifestError;

/// Errors from watcher operations.
///
/// `InitFailed` and a failed root watch abort `watch`; everything else is
/// logged and the loop keeps running.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("File system event error: {details}")]
    EventError { details: String },

    #[error("No watched unit is registered as '{owner}'")]
    UnknownOwner { owner: String },

    #[error("Rebuild of '{owner}' failed: {source}")]
    RebuildFailed {
        owner: String,
        #[source]
        source: AggregateError,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
