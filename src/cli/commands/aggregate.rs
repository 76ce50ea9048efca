//! `docgen aggregate`: one full batch build.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{build_context, discover};
use crate::aggregate::{AggregateSummary, Aggregator, OutputFormat};
use crate::config::Settings;
use crate::status::BuildMode;

/// Arguments of one batch run.
pub struct AggregateArgs {
    pub output_dir: PathBuf,
    pub mode: BuildMode,
    pub format: OutputFormat,
    pub clean: bool,
}

pub fn run(args: AggregateArgs, start: &Path, settings: &Settings) -> Result<AggregateSummary> {
    let (discovery, locator) = discover(start, settings)?;
    crate::log_event!(
        "aggregate",
        "starting",
        "{} workspaces, mode {}, format {:?}",
        discovery.workspaces.len(),
        args.mode,
        args.format
    );

    let ctx = build_context(settings, locator, args.output_dir.clone(), args.mode, args.format);
    let (_, summary) = Aggregator::new(ctx)
        .with_clean(args.clean)
        .run(&discovery)
        .with_context(|| format!("Aggregation into {} failed", args.output_dir.display()))?;

    println!(
        "Aggregated {} packages and {} collections into {} ({} skipped, {} failed)",
        summary.packages,
        summary.collections,
        args.output_dir.display(),
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}
