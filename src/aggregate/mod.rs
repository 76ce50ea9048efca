//! Batch aggregation: every discovered package into one output tree.
//!
//! A single pass over the workspaces found by discovery. Each package is a
//! unit; a unit that fails is logged and left out while the run carries on.
//! Only failing to prepare the output directory or to write the manifest
//! aborts the run.

pub mod assets;
pub mod collection;
mod error;
pub mod generator;
pub mod paths;
pub mod transform;
pub mod unit;

pub use collection::{SECTIONS_DIR, build_collection, collection_dirs};
pub use error::{AggregateError, AggregateResult};
pub use generator::{CommandCapture, ContentGenerator, GenerateError};
pub use transform::OutputFormat;
pub use unit::{BuildContext, PackageBuild, build_package};

use std::fs;

use crate::discovery::{DiscoveryResult, Workspace};
use crate::manifest::Manifest;

/// Counts reported at the end of a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateSummary {
    pub packages: usize,
    pub collections: usize,
    /// Units without config, disabled, empty or not allowed by the sidebar.
    pub skipped: usize,
    pub failed: usize,
}

impl AggregateSummary {
    pub fn is_empty(&self) -> bool {
        self.packages == 0 && self.collections == 0
    }
}

/// Runs a batch build over a discovery result.
pub struct Aggregator {
    ctx: BuildContext,
    clean: bool,
}

impl Aggregator {
    pub fn new(ctx: BuildContext) -> Self {
        Self { ctx, clean: false }
    }

    /// Remove the whole output directory before building.
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Build every package and write the manifest.
    pub fn run(&self, discovery: &DiscoveryResult) -> AggregateResult<(Manifest, AggregateSummary)> {
        self.prepare_output()?;

        let mode = self.ctx.mode;
        let sidebar = discovery
            .local_config
            .as_ref()
            .and_then(|config| config.sidebar.as_ref());
        let allowed = sidebar.and_then(|s| s.allowed_packages(mode));

        let mut manifest = Manifest::new(mode);
        let mut summary = AggregateSummary::default();

        for workspace in &discovery.workspaces {
            if allowed.as_ref().is_some_and(|a| !a.contains(&workspace.name)) {
                crate::debug_event!("aggregate", "not in sidebar", "{}", workspace.key());
                summary.skipped += 1;
                continue;
            }
            self.build_one(workspace, &mut manifest, &mut summary);
        }

        manifest.sidebar = sidebar.map(|s| s.filtered(mode));
        manifest.normalize();
        let path = manifest.write(&self.ctx.output_root)?;

        if summary.is_empty() {
            tracing::warn!(
                "[aggregate] NO PACKAGES AGGREGATED: {} workspaces discovered, none produced output for mode '{mode}'",
                discovery.workspaces.len()
            );
        }
        crate::log_event!(
            "aggregate",
            "complete",
            "{} packages, {} collections, {} skipped, {} failed -> {}",
            summary.packages,
            summary.collections,
            summary.skipped,
            summary.failed,
            path.display()
        );

        Ok((manifest, summary))
    }

    fn build_one(&self, workspace: &Workspace, manifest: &mut Manifest, summary: &mut AggregateSummary) {
        match build_package(&self.ctx, workspace) {
            Ok(PackageBuild::Built(entry)) => {
                manifest.packages.push(entry);
                summary.packages += 1;
            }
            Ok(PackageBuild::Collections(sections)) => {
                summary.collections += sections.len();
                manifest.website_sections.extend(sections);
            }
            Ok(PackageBuild::NoConfig) => {
                crate::debug_event!("aggregate", "no config", "{}", workspace.key());
                summary.skipped += 1;
            }
            Ok(PackageBuild::Disabled) => {
                crate::log_event!("aggregate", "disabled", "{}", workspace.key());
                summary.skipped += 1;
            }
            Ok(PackageBuild::Empty) => {
                crate::log_event!("aggregate", "nothing visible", "{}", workspace.key());
                summary.skipped += 1;
            }
            Err(e) => {
                tracing::error!("[aggregate] {} failed: {e}", workspace.key());
                summary.failed += 1;
            }
        }
    }

    fn prepare_output(&self) -> AggregateResult<()> {
        let root = &self.ctx.output_root;
        let setup = |source: std::io::Error| AggregateError::Setup {
            path: root.clone(),
            source,
        };

        if self.clean && root.exists() {
            crate::log_event!("aggregate", "cleaning", "{}", root.display());
            fs::remove_dir_all(root).map_err(setup)?;
        }
        fs::create_dir_all(root).map_err(setup)
    }
}
