//! `docgen list`: what discovery found and what would be built.

use std::path::Path;

use anyhow::Result;

use super::discover;
use crate::aggregate::collection::collection_dirs;
use crate::config::Settings;
use crate::discovery::Workspace;
use crate::package::DocConfig;
use crate::source::SourceLocator;
use crate::status::BuildMode;

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub key: String,
    pub source: String,
    pub detail: String,
}

pub fn run(mode: BuildMode, start: &Path, settings: &Settings) -> Result<()> {
    let (discovery, locator) = discover(start, settings)?;
    let rows = rows(&discovery.workspaces, &locator, mode);

    if rows.is_empty() {
        println!(
            "No documented packages found ({} workspaces scanned)",
            discovery.workspaces.len()
        );
        return Ok(());
    }

    let width = rows.iter().map(|r| r.key.len()).max().unwrap_or(0);
    for row in &rows {
        println!("{:<width$}  {:<9}  {}", row.key, row.source, row.detail);
    }
    Ok(())
}

/// Rows for every enabled package that has a config.
pub fn rows(workspaces: &[Workspace], locator: &SourceLocator, mode: BuildMode) -> Vec<PackageRow> {
    let mut rows = Vec::new();
    for workspace in workspaces {
        let Some(root) = locator.resolve(workspace) else {
            continue;
        };
        let detail = match DocConfig::load(&root.config_path()) {
            Ok(config) if !config.enabled => continue,
            Ok(config) if config.is_sections_mode() => {
                format!("{} collections", collection_dirs(&root.base).len())
            }
            Ok(config) => format!(
                "{}/{} sections visible in {mode}",
                config.visible_sections(mode).len(),
                config.sections.len()
            ),
            Err(e) => format!("invalid config: {e}"),
        };
        rows.push(PackageRow {
            key: workspace.key(),
            source: root.kind.to_string(),
            detail,
        });
    }
    rows
}
