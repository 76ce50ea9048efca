//! `docgen watch`: initial build, then incremental rebuilds until Ctrl-C.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::{build_context, discover};
use crate::aggregate::{Aggregator, OutputFormat};
use crate::config::Settings;
use crate::status::BuildMode;
use crate::watcher::{IncrementalRebuilder, LiveWatcher, WatchedUnit};

pub struct WatchArgs {
    pub website_dir: PathBuf,
    pub mode: BuildMode,
    pub debounce: Option<u64>,
    pub skip_initial: bool,
}

pub async fn run(args: WatchArgs, start: &Path, settings: &Settings) -> Result<()> {
    let (discovery, locator) = discover(start, settings)?;
    let ctx = build_context(
        settings,
        locator,
        args.website_dir.clone(),
        args.mode,
        OutputFormat::Website,
    );

    if args.skip_initial {
        crate::debug_event!("watch", "initial build skipped");
    } else {
        Aggregator::new(ctx.clone())
            .run(&discovery)
            .with_context(|| format!("Initial build into {} failed", args.website_dir.display()))?;
    }

    let sidebar = discovery
        .local_config
        .as_ref()
        .and_then(|config| config.sidebar.clone());
    let units = WatchedUnit::plan(&discovery, &ctx);
    let debounce_ms = args.debounce.unwrap_or(settings.watch.debounce_ms);
    crate::log_event!(
        "watch",
        "starting",
        "{} units, mode {}, debounce {debounce_ms}ms -> {}",
        units.len(),
        args.mode,
        args.website_dir.display()
    );

    let rebuilder = Arc::new(IncrementalRebuilder::new(ctx, sidebar));
    let watcher = LiveWatcher::new(rebuilder, units, debounce_ms)
        .context("Failed to start the file watcher")?;
    watcher.watch().await?;
    Ok(())
}
