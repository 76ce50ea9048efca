//! Recursive coverage on top of a directory-level watch primitive.
//!
//! The backend only watches single directories. [`RecursiveWatcher`] walks
//! a root, watches every directory below it except dot-prefixed ones, and
//! remembers which owner each root belongs to so any event path can be
//! mapped back to the unit that must be rebuilt. It carries no policy about
//! which events matter.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use notify::{RecursiveMode, Watcher};
use walkdir::WalkDir;

use super::error::WatchError;
use crate::aggregate::assets::is_hidden;

/// A backend that can watch one directory, non-recursively.
pub trait DirectoryWatch: Send {
    fn watch_dir(&mut self, dir: &Path) -> Result<(), WatchError>;
}

impl DirectoryWatch for notify::RecommendedWatcher {
    fn watch_dir(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Directory-tree watcher with owner lookup.
pub struct RecursiveWatcher<W> {
    backend: W,
    /// Owner roots: directory -> owner key.
    owners: HashMap<PathBuf, String>,
    /// Directories already handed to the backend.
    watched: HashSet<PathBuf>,
}

impl<W: DirectoryWatch> RecursiveWatcher<W> {
    pub fn new(backend: W) -> Self {
        Self {
            backend,
            owners: HashMap::new(),
            watched: HashSet::new(),
        }
    }

    /// Watch `root` and every non-dot directory below it, recording
    /// `owner` for the tree.
    ///
    /// Fails only if `root` itself cannot be watched; failing
    /// subdirectories are logged and skipped. Returns the number of
    /// directories newly watched.
    pub fn add_recursive(&mut self, root: &Path, owner: &str) -> Result<usize, WatchError> {
        self.owners.insert(root.to_path_buf(), owner.to_string());

        let mut added = 0;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(WatchError::PathWatchFailed {
                        path: root.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("[watcher] skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            match self.watch_one(entry.path()) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) if entry.depth() == 0 => return Err(e),
                Err(e) => tracing::warn!("[watcher] {e}"),
            }
        }

        crate::debug_event!("watcher", "covered", "{owner}: {} (+{added} dirs)", root.display());
        Ok(added)
    }

    /// Register `owner` for a root that may not exist yet.
    ///
    /// The nearest existing ancestor gets a plain watch so the root's
    /// creation is seen and [`extend`](Self::extend) can pick it up.
    pub fn expect_root(&mut self, root: &Path, owner: &str) -> Result<(), WatchError> {
        self.owners.insert(root.to_path_buf(), owner.to_string());

        let Some(anchor) = root.ancestors().skip(1).find(|dir| dir.is_dir()) else {
            return Err(WatchError::PathWatchFailed {
                path: root.to_path_buf(),
                reason: "no existing ancestor".to_string(),
            });
        };
        self.watch_one(anchor)?;
        Ok(())
    }

    /// Extend coverage to a directory that appeared while watching.
    ///
    /// Directories inside an owned tree are added recursively unless they
    /// sit below one of its dot directories. Directories on the way to an
    /// expected root get a plain watch whatever their name (`~/.docgen`),
    /// and any expected root that already exists below them is added.
    pub fn extend(&mut self, dir: &Path) -> usize {
        if !dir.is_dir() {
            return 0;
        }

        if let Some(owner) = self.find_owner(dir).map(str::to_string) {
            if self.has_hidden_component(dir) {
                return 0;
            }
            return self.add_recursive(dir, &owner).unwrap_or_else(|e| {
                tracing::warn!("[watcher] {e}");
                0
            });
        }

        let pending: Vec<(PathBuf, String)> = self
            .owners
            .iter()
            .filter(|(root, _)| root.starts_with(dir) && root.as_path() != dir)
            .map(|(root, owner)| (root.clone(), owner.clone()))
            .collect();
        if pending.is_empty() {
            return 0;
        }

        let mut added = 0;
        for (root, owner) in pending {
            added += self.watch_towards(dir, &root, &owner);
        }
        added
    }

    /// Owner of `path`: the nearest ancestor (or `path` itself) recorded
    /// as an owner root.
    pub fn find_owner(&self, path: &Path) -> Option<&str> {
        path.ancestors()
            .find_map(|dir| self.owners.get(dir))
            .map(String::as_str)
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    pub fn owner_count(&self) -> usize {
        self.owners.values().collect::<HashSet<_>>().len()
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &W {
        &self.backend
    }

    /// Plain-watch each existing directory from `from` down to `root`,
    /// then add `root` recursively if it exists.
    fn watch_towards(&mut self, from: &Path, root: &Path, owner: &str) -> usize {
        let mut added = 0;
        let mut steps: Vec<&Path> = root
            .ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(from))
            .collect();
        steps.reverse();

        for dir in steps {
            if !dir.is_dir() {
                return added;
            }
            match self.watch_one(dir) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("[watcher] {e}");
                    return added;
                }
            }
        }

        if root.is_dir() {
            match self.add_recursive(root, owner) {
                Ok(n) => added += n,
                Err(e) => tracing::warn!("[watcher] {e}"),
            }
        }
        added
    }

    fn watch_one(&mut self, dir: &Path) -> Result<bool, WatchError> {
        if self.watched.contains(dir) {
            return Ok(false);
        }
        self.backend.watch_dir(dir)?;
        self.watched.insert(dir.to_path_buf());
        Ok(true)
    }

    /// Whether `dir` sits below a dot directory of an owned tree.
    fn has_hidden_component(&self, dir: &Path) -> bool {
        let Some(owned) = dir.ancestors().find(|a| self.owners.contains_key(*a)) else {
            return false;
        };
        dir.ancestors()
            .take_while(|a| *a != owned)
            .any(is_hidden)
    }
}
