//! Manifest consumed by the site generator.
//!
//! The schema is an external contract: field names and nesting must stay
//! stable. Apart from `generated_at`, serialising the same inputs twice
//! produces identical bytes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::package::SidebarConfig;
use crate::source::RootKind;
use crate::status::{BuildMode, PublicationStatus};

/// Filename of the manifest at the output root.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Cannot read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest {path} is not valid JSON: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Cannot write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub mode: BuildMode,
    pub packages: Vec<PackageManifest>,
    pub website_sections: Vec<WebsiteSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<SidebarConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageManifest {
    pub name: String,
    pub ecosystem: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub source: RootKind,
    /// Output subdirectory, relative to the output root.
    pub path: String,
    pub sections: Vec<SectionEntry>,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub concepts: Vec<ConceptEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionEntry {
    pub name: String,
    pub title: String,
    pub order: i64,
    /// Output file, relative to the output root.
    pub file: String,
    pub status: PublicationStatus,
    /// Owning concept id for concept files.
    #[serde(default)]
    pub concept: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: PublicationStatus,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebsiteSection {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub order: i64,
    /// Output subdirectory, relative to the output root.
    pub path: String,
    pub files: Vec<SectionEntry>,
}

impl Manifest {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            generated_at: Utc::now(),
            mode,
            packages: Vec::new(),
            website_sections: Vec::new(),
            sidebar: None,
        }
    }

    /// Put entries into their canonical order.
    pub fn normalize(&mut self) {
        self.packages.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.ecosystem.cmp(&b.ecosystem))
        });
        for pkg in &mut self.packages {
            sort_entries(&mut pkg.sections);
        }
        self.website_sections
            .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        for section in &mut self.website_sections {
            sort_entries(&mut section.files);
        }
    }

    /// Replace (or with `None`, remove) the entry for one package.
    pub fn upsert_package(&mut self, ecosystem: &str, name: &str, entry: Option<PackageManifest>) {
        self.packages
            .retain(|p| !(p.name == name && p.ecosystem == ecosystem));
        if let Some(entry) = entry {
            self.packages.push(entry);
        }
        self.normalize();
    }

    /// Replace (or with `None`, remove) one website section.
    pub fn upsert_website_section(&mut self, name: &str, entry: Option<WebsiteSection>) {
        self.website_sections.retain(|s| s.name != name);
        if let Some(entry) = entry {
            self.website_sections.push(entry);
        }
        self.normalize();
    }

    pub fn path_in(output_root: &Path) -> PathBuf {
        output_root.join(MANIFEST_FILE)
    }

    /// Read an existing manifest.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read the manifest under `output_root`, or start an empty one.
    pub fn load_or_new(output_root: &Path, mode: BuildMode) -> Self {
        let path = Self::path_in(output_root);
        if !path.exists() {
            return Self::new(mode);
        }
        match Self::load(&path) {
            Ok(mut manifest) => {
                manifest.mode = mode;
                manifest
            }
            Err(e) => {
                tracing::warn!("[manifest] starting fresh: {e}");
                Self::new(mode)
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Serialize into `output_root/manifest.json`, replacing it atomically.
    pub fn write(&self, output_root: &Path) -> Result<PathBuf, ManifestError> {
        let path = Self::path_in(output_root);
        let json = self.to_json()?;
        let write_err = |source| ManifestError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(output_root).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(output_root).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        crate::debug_event!("manifest", "written", "{}", path.display());
        Ok(path)
    }
}

fn sort_entries(entries: &mut [SectionEntry]) {
    entries.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, order: i64) -> SectionEntry {
        SectionEntry {
            name: name.to_string(),
            title: name.to_uppercase(),
            order,
            file: format!("pkg/{name}.md"),
            status: PublicationStatus::Production,
            concept: None,
        }
    }

    fn package(name: &str, sections: Vec<SectionEntry>) -> PackageManifest {
        PackageManifest {
            name: name.to_string(),
            ecosystem: "main".to_string(),
            title: name.to_string(),
            description: None,
            category: None,
            source: RootKind::Legacy,
            path: name.to_string(),
            sections,
            changelog: None,
            concepts: Vec::new(),
        }
    }

    #[test]
    fn test_normalize_orders_everything() {
        let mut manifest = Manifest::new(BuildMode::Dev);
        manifest.packages.push(package("zeta", vec![entry("b", 2), entry("a", 2), entry("c", 1)]));
        manifest.packages.push(package("alpha", vec![]));
        manifest.normalize();

        assert_eq!(manifest.packages[0].name, "alpha");
        let names: Vec<_> = manifest.packages[1]
            .sections
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_upsert_replaces_and_removes() {
        let mut manifest = Manifest::new(BuildMode::Prod);
        manifest.upsert_package("main", "core", Some(package("core", vec![entry("a", 1)])));
        manifest.upsert_package("main", "core", Some(package("core", vec![entry("b", 1)])));
        assert_eq!(manifest.packages.len(), 1);
        assert_eq!(manifest.packages[0].sections[0].name, "b");

        manifest.upsert_package("main", "core", None);
        assert!(manifest.packages.is_empty());
    }

    #[test]
    fn test_write_and_load() {
        let temp = TempDir::new().unwrap();
        let mut manifest = Manifest::new(BuildMode::Dev);
        manifest.upsert_package("main", "core", Some(package("core", vec![entry("a", 1)])));

        let path = manifest.write(temp.path()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        assert!(text.contains("\"website_sections\""));
        assert!(text.contains("\"source\": \"legacy\""));

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_load_or_new_tolerates_garbage() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), "not json").unwrap();
        let manifest = Manifest::load_or_new(temp.path(), BuildMode::Dev);
        assert!(manifest.packages.is_empty());
    }

    #[test]
    fn test_sidebar_omitted_when_absent() {
        let manifest = Manifest::new(BuildMode::Dev);
        assert!(!manifest.to_json().unwrap().contains("\"sidebar\""));
    }
}
