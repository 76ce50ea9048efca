//! Live watch loop: notify events in, debounced per-owner rebuilds out.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use notify::Event;
use tokio::sync::mpsc;
use walkdir::WalkDir;

use super::debouncer::Coalescer;
use super::error::WatchError;
use super::handler::{EventClass, UnitRebuilder, qualifies};
use super::rebuilder::{IncrementalRebuilder, WatchedUnit};
use super::recursive::{DirectoryWatch, RecursiveWatcher};

/// Routes filesystem events to coverage extension or owner marks.
pub struct Dispatcher<W, R> {
    watcher: RecursiveWatcher<W>,
    coalescer: Coalescer<R>,
}

impl<W: DirectoryWatch, R: UnitRebuilder> Dispatcher<W, R> {
    pub fn new(backend: W, coalescer: Coalescer<R>) -> Self {
        Self {
            watcher: RecursiveWatcher::new(backend),
            coalescer,
        }
    }

    /// Cover every root of `unit`.
    ///
    /// Existing roots are watched recursively; missing ones are expected so
    /// their creation is noticed.
    pub fn cover(&mut self, unit: &WatchedUnit) -> Result<(), WatchError> {
        for root in &unit.roots {
            if let Err(e) = self.watcher.expect_root(root, &unit.owner) {
                tracing::warn!("[watcher] {e}");
            }
            if root.is_dir() {
                self.watcher.add_recursive(root, &unit.owner)?;
            }
        }
        Ok(())
    }

    /// Handle one event. Returns the owners marked dirty.
    ///
    /// An existing directory (created or renamed into place) extends
    /// coverage; if that adds watches, qualifying files already inside it
    /// dirty their owners. An empty new directory marks nothing.
    pub fn handle_event(&mut self, event: &Event) -> Vec<String> {
        let class = EventClass::of(&event.kind);
        if class == EventClass::Ignore {
            return Vec::new();
        }

        let mut marked = Vec::new();
        for path in &event.paths {
            if path.is_dir() {
                let added = self.watcher.extend(path);
                if added > 0 {
                    crate::debug_event!("watcher", "extended", "{} (+{added} dirs)", path.display());
                    marked.extend(self.mark_existing(path));
                }
                continue;
            }
            if let Some(owner) = self.owner_of(path) {
                crate::debug_event!("watcher", "dirty", "{owner} <- {}", path.display());
                self.coalescer.mark(&owner);
                marked.push(owner);
            }
        }
        marked
    }

    /// Mark the owners of qualifying files already inside a newly covered
    /// directory. Files written before the watch was in place raise no
    /// events of their own.
    fn mark_existing(&self, dir: &Path) -> Vec<String> {
        let owners: BTreeSet<String> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !e.file_type().is_dir() || self.watcher.is_watched(e.path()))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| self.owner_of(e.path()))
            .collect();

        for owner in &owners {
            crate::debug_event!("watcher", "dirty", "{owner} <- {} (existing files)", dir.display());
            self.coalescer.mark(owner);
        }
        owners.into_iter().collect()
    }

    fn owner_of(&self, path: &Path) -> Option<String> {
        if !qualifies(path) {
            return None;
        }
        self.watcher.find_owner(path).map(str::to_string)
    }

    pub fn watcher(&self) -> &RecursiveWatcher<W> {
        &self.watcher
    }
}

/// The `watch` command's engine over the platform notify backend.
pub struct LiveWatcher {
    dispatcher: Dispatcher<notify::RecommendedWatcher, IncrementalRebuilder>,
    event_rx: mpsc::Receiver<Event>,
    error_rx: mpsc::Receiver<notify::Error>,
}

impl LiveWatcher {
    /// Create the notify backend and cover every unit.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        rebuilder: Arc<IncrementalRebuilder>,
        units: Vec<WatchedUnit>,
        debounce_ms: u64,
    ) -> Result<Self, WatchError> {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (error_tx, error_rx) = mpsc::channel(16);

        let backend = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = event_tx.blocking_send(event);
            }
            Err(e) => {
                let _ = error_tx.blocking_send(e);
            }
        })?;

        let coalescer = Coalescer::new(Arc::clone(&rebuilder), debounce_ms);
        let mut dispatcher = Dispatcher::new(backend, coalescer);
        for unit in units {
            dispatcher.cover(&unit)?;
            rebuilder.register(unit);
        }

        Ok(Self {
            dispatcher,
            event_rx,
            error_rx,
        })
    }

    /// Run until Ctrl-C or until the event source closes.
    pub async fn watch(mut self) -> Result<(), WatchError> {
        let watcher = self.dispatcher.watcher();
        crate::log_event!(
            "watcher",
            "monitoring",
            "{} units in {} directories",
            watcher.owner_count(),
            watcher.watched_count()
        );

        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    self.dispatcher.handle_event(&event);
                }

                Some(err) = self.error_rx.recv() => {
                    let err = WatchError::EventError { details: err.to_string() };
                    tracing::error!("[watcher] {err}");
                }

                _ = tokio::signal::ctrl_c() => {
                    crate::log_event!("watcher", "interrupted");
                    break;
                }

                else => {
                    tracing::warn!("[watcher] event source closed");
                    break;
                }
            }
        }

        Ok(())
    }
}
