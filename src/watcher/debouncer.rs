//! Trailing-edge debounce over dirty owners.
//!
//! Every qualifying event marks its owner dirty and re-arms a single timer.
//! When the timer survives a full quiet interval it drains the dirty set
//! and rebuilds each owner once, so a burst of saves (auto-save, formatter,
//! `git checkout`) collapses into one rebuild per owner.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::handler::UnitRebuilder;

/// Dirty owners plus the one armed timer, mutated under one lock.
#[derive(Default)]
struct PendingSet {
    owners: BTreeSet<String>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every mark; a timer only drains if it is still current.
    generation: u64,
}

struct Shared<R> {
    pending: Mutex<PendingSet>,
    /// Held for the whole of a drained batch; no owner is rebuilt twice at once.
    rebuild_gate: Mutex<()>,
    rebuilder: Arc<R>,
    quiet: Duration,
    batches: AtomicU64,
}

/// Coalesces owner marks into debounced rebuilds.
///
/// Must be used from inside a tokio runtime.
pub struct Coalescer<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for Coalescer<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: UnitRebuilder> Coalescer<R> {
    /// Create a coalescer with the given quiet interval in milliseconds.
    pub fn new(rebuilder: Arc<R>, debounce_ms: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: Mutex::new(PendingSet::default()),
                rebuild_gate: Mutex::new(()),
                rebuilder,
                quiet: Duration::from_millis(debounce_ms),
                batches: AtomicU64::new(0),
            }),
        }
    }

    /// Mark `owner` dirty and restart the quiet interval.
    pub fn mark(&self, owner: &str) {
        let mut pending = self.shared.pending.lock();
        pending.owners.insert(owner.to_string());
        pending.generation += 1;
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }

        let shared = Arc::clone(&self.shared);
        let generation = pending.generation;
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(shared.quiet).await;
            Shared::fire(shared, generation).await;
        }));
    }

    /// Owners marked but not yet drained.
    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().owners.len()
    }

    /// Number of drained batches so far.
    pub fn batches(&self) -> u64 {
        self.shared.batches.load(Ordering::Relaxed)
    }
}

impl<R: UnitRebuilder> Shared<R> {
    async fn fire(shared: Arc<Self>, generation: u64) {
        let owners = {
            let mut pending = shared.pending.lock();
            if pending.generation != generation {
                return;
            }
            // Detach so a later mark does not abort a batch in progress.
            pending.timer = None;
            std::mem::take(&mut pending.owners)
        };
        if owners.is_empty() {
            return;
        }
        shared.batches.fetch_add(1, Ordering::Relaxed);

        let worker = Arc::clone(&shared);
        let result = tokio::task::spawn_blocking(move || worker.rebuild_all(owners)).await;
        if let Err(e) = result {
            tracing::error!("[watcher] rebuild task failed: {e}");
        }
    }

    fn rebuild_all(&self, owners: BTreeSet<String>) {
        let _gate = self.rebuild_gate.lock();
        for owner in owners {
            match self.rebuilder.rebuild(&owner) {
                Ok(outcome) => crate::log_event!("watcher", "rebuilt", "{owner}: {outcome}"),
                Err(e) => tracing::error!("[watcher] {e}"),
            }
        }
    }
}
