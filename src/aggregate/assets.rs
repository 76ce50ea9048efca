//! Copying asset folders and single files into the output tree.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::{AggregateError, AggregateResult};
use crate::discovery::Workspace;
use crate::source::{ASSET_DIRS, SourceLocator};

/// Recursively copy `src` into `dest`, skipping dot-prefixed entries.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> AggregateResult<usize> {
    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            AggregateError::io(path, std::io::Error::other(e.to_string()))
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| AggregateError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| AggregateError::io(&target, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy each known asset folder for `workspace` under `dest`.
///
/// A folder that already exists in `dest` is replaced so deleted assets do
/// not linger. Returns the output folders written.
pub fn copy_assets(
    locator: &SourceLocator,
    workspace: &Workspace,
    dest: &Path,
) -> AggregateResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for folder in ASSET_DIRS {
        let target = dest.join(folder);
        let Some(source) = locator.asset_dir(workspace, folder) else {
            remove_dir_if_exists(&target)?;
            continue;
        };
        remove_dir_if_exists(&target)?;
        let count = copy_tree(&source, &target)?;
        crate::debug_event!("assets", "copied", "{count} files from {}", source.display());
        written.push(target);
    }
    Ok(written)
}

/// Copy the folders of a unit whose assets live under one root.
pub fn copy_assets_from(root: &Path, dest: &Path) -> AggregateResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for folder in ASSET_DIRS {
        let source = root.join(folder);
        let target = dest.join(folder);
        remove_dir_if_exists(&target)?;
        if source.is_dir() {
            copy_tree(&source, &target)?;
            written.push(target);
        }
    }
    Ok(written)
}

pub fn remove_dir_if_exists(path: &Path) -> AggregateResult<()> {
    if path.is_dir() {
        fs::remove_dir_all(path).map_err(|e| AggregateError::io(path, e))?;
    }
    Ok(())
}

/// Whether the final component of `path` starts with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
