//! What the watcher does with an event: classification and the rebuild seam.

use std::fmt;
use std::path::Path;

use notify::EventKind;

use super::WatchError;
use crate::package::CONFIG_FILENAME;

/// Extensions whose changes count as content edits.
pub const CONTENT_EXTENSIONS: &[&str] = &[
    "md", "mdx", "markdown", "yml", "yaml", "json", "txt", "png", "jpg", "jpeg", "gif", "svg",
    "webp", "cast", "mp4", "webm",
];

/// Whether a change to `path` should dirty its owner.
pub fn qualifies(path: &Path) -> bool {
    if path.file_name().is_some_and(|name| name == CONFIG_FILENAME) {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CONTENT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// How an event is treated by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// A new directory extends coverage; a new file is a change.
    Create,
    /// Modification, rename or removal.
    Change,
    /// Access and other metadata-free noise.
    Ignore,
}

impl EventClass {
    pub fn of(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Create,
            EventKind::Modify(_) | EventKind::Remove(_) => Self::Change,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Self::Ignore,
        }
    }
}

/// Result of rebuilding one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Output and manifest entry written.
    Written { entries: usize },
    /// Nothing visible any more; output and manifest entry removed.
    Removed,
}

impl fmt::Display for RebuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written { entries } => write!(f, "written ({entries} entries)"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// Rebuilds one dirty owner.
///
/// Called from the blocking pool, one owner at a time. Implementations
/// must reload everything they need from disk on each call.
pub trait UnitRebuilder: Send + Sync + 'static {
    fn rebuild(&self, owner: &str) -> Result<RebuildOutcome, WatchError>;
}
