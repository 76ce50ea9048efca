//! Source location: which of two roots is authoritative for a package.
//!
//! A package's documentation lives either in the authoring location
//! (`<authoring_root>/<ecosystem>/<package>`) or in the legacy in-repo
//! `docs/` directory. When the authoring location holds a config file it
//! wins outright; nothing is merged from the legacy root. Resolution hits
//! the filesystem on every call so a config created while watching is
//! observed on the next rebuild.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discovery::Workspace;
use crate::package::CONFIG_FILENAME;

/// In-repo directory used before the authoring location existed.
pub const LEGACY_DIR: &str = "docs";

/// Asset subfolders copied verbatim into the output tree.
pub const ASSET_DIRS: [&str; 3] = ["images", "asciicasts", "videos"];

/// Which candidate a [`ContentRoot`] was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    Authoring,
    Legacy,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authoring => f.write_str("authoring"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

/// The resolved, authoritative documentation root of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRoot {
    pub kind: RootKind,
    pub base: PathBuf,
}

impl ContentRoot {
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.base.join(relative)
    }

    pub fn config_path(&self) -> PathBuf {
        self.join(CONFIG_FILENAME)
    }
}

/// Resolves content roots against a fixed authoring base.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    authoring_root: PathBuf,
}

impl SourceLocator {
    pub fn new(authoring_root: impl Into<PathBuf>) -> Self {
        Self {
            authoring_root: authoring_root.into(),
        }
    }

    pub fn authoring_root(&self) -> &Path {
        &self.authoring_root
    }

    /// Authoring candidate for a package, whether or not it exists.
    pub fn authoring_dir(&self, workspace: &Workspace) -> PathBuf {
        self.authoring_root
            .join(&workspace.ecosystem)
            .join(&workspace.name)
    }

    /// Legacy candidate for a package, whether or not it exists.
    pub fn legacy_dir(&self, workspace: &Workspace) -> PathBuf {
        workspace.path.join(LEGACY_DIR)
    }

    /// Authoritative root for `workspace`, or `None` if neither candidate
    /// holds a config file.
    pub fn resolve(&self, workspace: &Workspace) -> Option<ContentRoot> {
        let authoring = self.authoring_dir(workspace);
        if authoring.join(CONFIG_FILENAME).is_file() {
            return Some(ContentRoot {
                kind: RootKind::Authoring,
                base: authoring,
            });
        }

        let legacy = self.legacy_dir(workspace);
        if legacy.join(CONFIG_FILENAME).is_file() {
            return Some(ContentRoot {
                kind: RootKind::Legacy,
                base: legacy,
            });
        }

        None
    }

    /// Source directory for one asset subfolder: authoring first, legacy
    /// as fallback.
    pub fn asset_dir(&self, workspace: &Workspace, folder: &str) -> Option<PathBuf> {
        [self.authoring_dir(workspace), self.legacy_dir(workspace)]
            .into_iter()
            .map(|base| base.join(folder))
            .find(|dir| dir.is_dir())
    }
}
