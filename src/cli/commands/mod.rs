//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod aggregate;
pub mod config;
pub mod list;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::aggregate::{BuildContext, CommandCapture, OutputFormat};
use crate::config::Settings;
use crate::discovery::{self, DiscoveryResult};
use crate::source::SourceLocator;
use crate::status::BuildMode;

/// Directory discovery starts from.
pub fn start_dir(root: Option<&Path>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root.to_path_buf()),
        None => std::env::current_dir().context("Cannot determine the current directory"),
    }
}

/// Run discovery; failure here is a setup failure.
pub fn discover(start: &Path, settings: &Settings) -> Result<(DiscoveryResult, SourceLocator)> {
    let locator = SourceLocator::new(&settings.authoring_root);
    let result = discovery::discover(start, settings, &locator)
        .with_context(|| format!("Discovery failed from {}", start.display()))?;
    Ok((result, locator))
}

/// Build context for writing into `output_root`.
pub fn build_context(
    settings: &Settings,
    locator: SourceLocator,
    output_root: PathBuf,
    mode: BuildMode,
    format: OutputFormat,
) -> BuildContext {
    BuildContext {
        output_root,
        mode,
        format,
        base_url: settings.website.base_url.clone(),
        locator,
        generator: Arc::new(CommandCapture),
    }
}
