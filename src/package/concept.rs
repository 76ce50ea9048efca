//! Concept manifests: independently publishable units nested in a package.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::PackageConfigError;
use crate::status::PublicationStatus;

/// Manifest filename inside each concept directory.
pub const CONCEPT_MANIFEST: &str = "concept.yml";

/// Directory (under a content root) holding concept subdirectories.
pub const CONCEPTS_DIR: &str = "concepts";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptManifest {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Authoring status, informational only.
    #[serde(default)]
    pub status: Option<String>,

    /// Publication status that gates visibility.
    #[serde(default)]
    pub docgen_publish: PublicationStatus,

    /// Explicit file ordering; empty means every markdown file by name.
    #[serde(default)]
    pub docgen_order: Vec<String>,
}

impl ConceptManifest {
    pub fn load(path: &Path) -> Result<Self, PackageConfigError> {
        let content = fs::read_to_string(path).map_err(|source| PackageConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml_ng::from_str(&content).map_err(|e| PackageConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Ordered list of files making up this concept, relative to `dir`.
    pub fn ordered_files(&self, dir: &Path) -> Vec<String> {
        if !self.docgen_order.is_empty() {
            return self.docgen_order.clone();
        }
        let mut files: Vec<String> = fs::read_dir(dir)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        files.sort();
        files
    }
}

/// Concept directories under a content root, sorted by name.
pub fn concept_dirs(content_root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(content_root.join(CONCEPTS_DIR))
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.join(CONCEPT_MANIFEST).is_file())
        .collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ordering_defaults_to_sorted_markdown() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("b.md"), "b").unwrap();
        fs::write(dir.join("a.md"), "a").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let manifest: ConceptManifest = serde_yaml_ng::from_str("id: routing").unwrap();
        assert_eq!(manifest.docgen_publish, PublicationStatus::Draft);
        assert_eq!(manifest.ordered_files(dir), vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_explicit_order_wins() {
        let manifest: ConceptManifest =
            serde_yaml_ng::from_str("id: x\ndocgen_publish: dev\ndocgen_order: [z.md, a.md]")
                .unwrap();
        assert_eq!(manifest.ordered_files(Path::new("/nonexistent")), vec!["z.md", "a.md"]);
    }

    #[test]
    fn test_concept_dirs_requires_manifest() {
        let temp = TempDir::new().unwrap();
        let concepts = temp.path().join(CONCEPTS_DIR);
        fs::create_dir_all(concepts.join("with")).unwrap();
        fs::create_dir_all(concepts.join("without")).unwrap();
        fs::write(concepts.join("with").join(CONCEPT_MANIFEST), "id: with").unwrap();

        let dirs = concept_dirs(temp.path());
        assert_eq!(dirs, vec![concepts.join("with")]);
    }
}
