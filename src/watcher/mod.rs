//! Live incremental rebuilds driven by filesystem events.
//!
//! # Architecture
//!
//! ```text
//! notify (one non-recursive watch per directory)
//!   |  events / errors (two channels)
//! LiveWatcher::watch          tokio::select! loop, Ctrl-C
//!   |
//! Dispatcher
//!   - RecursiveWatcher        coverage + owner lookup
//!   - Coalescer               dirty owners, one trailing-edge timer
//!         |
//!   spawn_blocking, one batch at a time
//!         |
//! IncrementalRebuilder        reload config, rebuild unit, patch manifest
//! ```
//!
//! Rebuilds run on the blocking pool so event intake continues while a
//! batch is in progress. Batches are serialised behind one gate, so a slow
//! rebuild still delays rebuilds of other owners marked meanwhile.

mod debouncer;
mod error;
mod handler;
mod live;
mod rebuilder;
mod recursive;

pub use debouncer::Coalescer;
pub use error::WatchError;
pub use handler::{CONTENT_EXTENSIONS, EventClass, RebuildOutcome, UnitRebuilder, qualifies};
pub use live::{Dispatcher, LiveWatcher};
pub use rebuilder::{IncrementalRebuilder, UnitShape, WatchedUnit};
pub use recursive::{DirectoryWatch, RecursiveWatcher};
