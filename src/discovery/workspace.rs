//! Workspace expansion: glob patterns to package directories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::ecosystem::{Ecosystem, dir_name};
use super::error::DiscoveryError;

/// A package directory inside an ecosystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Workspace {
    /// Directory basename.
    pub name: String,
    pub path: PathBuf,
    /// Name of the owning ecosystem.
    pub ecosystem: String,
}

impl Workspace {
    pub fn new(path: PathBuf, ecosystem: impl Into<String>) -> Self {
        Self {
            name: dir_name(&path),
            path,
            ecosystem: ecosystem.into(),
        }
    }

    /// Stable identity used as a watch owner key and in logs.
    pub fn key(&self) -> String {
        format!("{}/{}", self.ecosystem, self.name)
    }
}

/// Expand an ecosystem's patterns, keeping directory matches only.
///
/// Results are sorted by path and de-duplicated. Invalid patterns are
/// logged and skipped.
pub fn expand(ecosystem: &Ecosystem) -> Vec<Workspace> {
    let mut included = BTreeSet::new();
    let mut excluded = Vec::new();

    for raw in &ecosystem.patterns {
        let (negated, pattern) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw.as_str()),
        };
        let full = pattern_string(&ecosystem.root, pattern);

        if negated {
            match glob::Pattern::new(&full) {
                Ok(p) => excluded.push(p),
                Err(e) => log_invalid(raw, &e.to_string()),
            }
            continue;
        }

        match glob::glob(&full) {
            Ok(paths) => {
                for path in paths.filter_map(Result::ok) {
                    if path.is_dir() {
                        included.insert(path);
                    }
                }
            }
            Err(e) => log_invalid(raw, &e.to_string()),
        }
    }

    included
        .into_iter()
        .filter(|path| !excluded.iter().any(|p| p.matches_path(path)))
        .map(|path| Workspace::new(path, ecosystem.name.clone()))
        .collect()
}

fn pattern_string(root: &Path, pattern: &str) -> String {
    let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return glob::Pattern::escape(&root.to_string_lossy());
    }
    format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        trimmed
    )
}

fn log_invalid(pattern: &str, reason: &str) {
    let err = DiscoveryError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };
    tracing::warn!("[discovery] {err}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ecosystem(root: &Path, patterns: &[&str]) -> Ecosystem {
        Ecosystem {
            name: "main".to_string(),
            root: root.to_path_buf(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_expand_keeps_directories_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("packages/core")).unwrap();
        fs::create_dir_all(root.join("packages/cli")).unwrap();
        fs::write(root.join("packages/README.md"), "not a package").unwrap();

        let names: Vec<_> = expand(&ecosystem(root, &["packages/*"]))
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["cli", "core"]);
    }

    #[test]
    fn test_expand_excludes_and_dedupes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in ["packages/core", "packages/scratch", "tools/lint"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }

        let workspaces = expand(&ecosystem(
            root,
            &["packages/*", "./packages/core/", "tools/*", "!packages/scratch"],
        ));
        let names: Vec<_> = workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["core", "lint"]);
        assert!(workspaces.iter().all(|w| w.ecosystem == "main"));
        assert_eq!(workspaces[0].key(), "main/core");
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("packages/core")).unwrap();

        let workspaces = expand(&ecosystem(temp.path(), &["packages/[", "packages/*"]));
        assert_eq!(workspaces.len(), 1);
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let temp = TempDir::new().unwrap();
        assert!(expand(&ecosystem(temp.path(), &["packages/*"])).is_empty());
    }
}
