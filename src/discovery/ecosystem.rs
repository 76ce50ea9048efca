//! Ecosystem roots: repositories that declare glob workspace patterns.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::DiscoveryError;

const PACKAGE_JSON: &str = "package.json";
const CARGO_TOML: &str = "Cargo.toml";

/// A repository grouping packages through workspace patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ecosystem {
    /// Basename of the root directory.
    pub name: String,
    pub root: PathBuf,
    /// Glob patterns relative to `root`; a leading `!` excludes.
    pub patterns: Vec<String>,
}

impl Ecosystem {
    /// Read the workspace manifest at `root`, if it declares workspaces.
    pub fn from_root(root: &Path) -> Result<Option<Self>, DiscoveryError> {
        let patterns = match package_json_patterns(root)? {
            Some(patterns) => Some(patterns),
            None => cargo_patterns(root)?,
        };

        Ok(patterns.map(|patterns| Self {
            name: dir_name(root),
            root: root.to_path_buf(),
            patterns,
        }))
    }

    /// The nearest ancestor of `start` (inclusive) that is an ecosystem root.
    pub fn locate(start: &Path) -> Result<Self, DiscoveryError> {
        for ancestor in start.ancestors() {
            match Self::from_root(ancestor) {
                Ok(Some(ecosystem)) => return Ok(ecosystem),
                Ok(None) => {}
                Err(e) => tracing::warn!("[discovery] skipping {}: {e}", ancestor.display()),
            }
        }
        Err(DiscoveryError::NoEcosystem {
            start: start.to_path_buf(),
        })
    }
}

/// Basename of a directory, or its full display when it has none.
pub(crate) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn package_json_patterns(root: &Path) -> Result<Option<Vec<String>>, DiscoveryError> {
    let path = root.join(PACKAGE_JSON);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(None);
    };
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| DiscoveryError::InvalidManifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    // Either `"workspaces": [...]` or `"workspaces": { "packages": [...] }`.
    let list = match value.get("workspaces") {
        Some(serde_json::Value::Array(items)) => items,
        Some(serde_json::Value::Object(map)) => match map.get("packages") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };

    Ok(Some(
        list.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    ))
}

fn cargo_patterns(root: &Path) -> Result<Option<Vec<String>>, DiscoveryError> {
    let path = root.join(CARGO_TOML);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(None);
    };
    let table: toml::Table = toml::from_str(&content).map_err(|e| DiscoveryError::InvalidManifest {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let Some(workspace) = table.get("workspace").and_then(|w| w.as_table()) else {
        return Ok(None);
    };

    let strings = |key: &str| -> Vec<String> {
        workspace
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut patterns = strings("members");
    patterns.extend(strings("exclude").into_iter().map(|p| format!("!{p}")));
    Ok(Some(patterns))
}
