//! Per-package configuration (`docgen.config.yml`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::PackageConfigError;
use crate::status::{BuildMode, PublicationStatus, included};

/// Filename every documentation unit is keyed on.
pub const CONFIG_FILENAME: &str = "docgen.config.yml";

/// Top-level package configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocConfig {
    /// Disabled packages are skipped entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    /// Display order, used when the unit is a sections-mode collection.
    #[serde(default)]
    pub order: Option<i64>,

    #[serde(default)]
    pub settings: PackageSettings,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(default)]
    pub sidebar: Option<SidebarConfig>,
}

fn default_true() -> bool {
    true
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: None,
            description: None,
            category: None,
            order: None,
            settings: PackageSettings::default(),
            sections: Vec::new(),
            sidebar: None,
        }
    }
}

impl DocConfig {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, PackageConfigError> {
        let content = fs::read_to_string(path).map_err(|source| PackageConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse config text; `path` is only used for error reporting.
    pub fn parse(content: &str, path: &Path) -> Result<Self, PackageConfigError> {
        // An empty file is a valid, all-defaults config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content).map_err(|e| PackageConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Sections visible in `mode`, sorted by `(order, name)`.
    pub fn visible_sections(&self, mode: BuildMode) -> Vec<&Section> {
        let mut visible: Vec<&Section> = self
            .sections
            .iter()
            .filter(|s| included(s.effective_status(), mode))
            .collect();
        visible.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        visible
    }

    pub fn is_sections_mode(&self) -> bool {
        self.settings.output_mode == OutputMode::Sections
    }

    /// Display title, falling back to `fallback` (usually the package name).
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(fallback)
    }
}

/// Package-level settings block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PackageSettings {
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Passed through to the external content generator.
    #[serde(default)]
    pub model: Option<String>,

    /// Passed through to the external content generator.
    #[serde(default)]
    pub rules_file: Option<String>,

    /// Overrides the output subdirectory name (defaults to the package name).
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Ecosystems to aggregate; only read from the ecosystem root config.
    #[serde(default)]
    pub ecosystems: Option<Vec<String>>,
}

/// How a package maps onto the output tree.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One package, one output directory.
    #[default]
    Package,
    /// A set of independently configured sub-collections.
    Sections,
}

/// One documentation section of a package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub order: i64,

    #[serde(default)]
    pub status: Option<PublicationStatus>,

    /// Filename of the section, both in the content root and in the output.
    pub output: String,

    #[serde(default, rename = "type")]
    pub kind: SectionKind,

    /// Number of leading lines to drop before writing.
    #[serde(default)]
    pub strip_lines: Option<usize>,

    /// Command captured by `cli-capture` sections.
    #[serde(default)]
    pub command: Option<String>,
}

impl Section {
    /// The configured status, or draft when unset.
    pub fn effective_status(&self) -> PublicationStatus {
        self.status.unwrap_or_default()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Which generation strategy produces a section's source file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    /// Deposited by the external generator ahead of aggregation.
    #[default]
    Generated,
    /// Hand-written file.
    Static,
    /// Produced deterministically, in place, at aggregation time.
    #[serde(alias = "cli")]
    CliCapture,
}

impl SectionKind {
    /// Whether aggregation itself must produce the file.
    pub fn generated_in_place(&self) -> bool {
        matches!(self, Self::CliCapture)
    }
}

/// Sidebar layout, read from the ecosystem root config.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SidebarConfig {
    #[serde(default)]
    pub category_order: Vec<String>,

    #[serde(default)]
    pub categories: BTreeMap<String, SidebarCategory>,

    #[serde(default)]
    pub packages: BTreeMap<String, SidebarPackage>,

    #[serde(default)]
    pub package_category_override: BTreeMap<String, String>,
}

impl SidebarConfig {
    /// Package names allowed into the build, or `None` when the sidebar
    /// lists no packages (no allow-list in effect).
    pub fn allowed_packages(&self, mode: BuildMode) -> Option<Vec<String>> {
        if self.packages.is_empty() {
            return None;
        }
        Some(
            self.packages
                .iter()
                .filter(|(_, pkg)| included(pkg.status, mode))
                .map(|(name, _)| name.clone())
                .collect(),
        )
    }

    /// Copy of the sidebar with invisible packages removed.
    pub fn filtered(&self, mode: BuildMode) -> Self {
        let mut snapshot = self.clone();
        if self.packages.is_empty() {
            return snapshot;
        }
        snapshot.packages.retain(|_, pkg| included(pkg.status, mode));
        let visible = &snapshot.packages;
        snapshot
            .package_category_override
            .retain(|name, _| visible.contains_key(name));
        snapshot
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SidebarCategory {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SidebarPackage {
    #[serde(default)]
    pub status: PublicationStatus,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub order: Option<i64>,
}
