//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::aggregate::OutputFormat;
use crate::status::BuildMode;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Documentation aggregator
#[derive(Parser)]
#[command(
    name = "docgen",
    version = env!("CARGO_PKG_VERSION"),
    about = "Aggregate package documentation into one site-ready tree",
    long_about = "Discover documented packages across ecosystems, filter their content by \
                  publication status and write one output tree plus a manifest.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ docgen list --mode dev\n  $ docgen aggregate --output-dir dist/docs --mode prod\n  $ docgen watch --website-dir website/docs"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show detailed loading information
    #[arg(long, global = true)]
    pub info: bool,

    /// Directory to start ecosystem discovery from (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build every documented package into an output directory
    #[command(
        about = "Aggregate documentation into an output directory",
        after_help = "Examples:\n  docgen aggregate --output-dir dist/docs --mode prod\n  docgen aggregate --output-dir site/docs --mode dev --format website --clean"
    )]
    Aggregate {
        /// Output directory (created if missing)
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Build mode deciding which publication statuses are visible
        #[arg(long, value_enum)]
        mode: BuildMode,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Remove previous output before building
        #[arg(long)]
        clean: bool,
    },

    /// Watch authoring directories and rebuild changed units
    #[command(
        about = "Rebuild documentation incrementally as it is edited",
        after_help = "Examples:\n  docgen watch --website-dir website/docs\n  DOCGEN_MODE=prod docgen watch --website-dir website/docs --debounce 500"
    )]
    Watch {
        /// Live output directory of the website
        #[arg(long, value_name = "DIR")]
        website_dir: PathBuf,

        /// Build mode deciding which publication statuses are visible
        #[arg(long, value_enum, env = "DOCGEN_MODE", default_value_t = BuildMode::Dev)]
        mode: BuildMode,

        /// Quiet interval in milliseconds (overrides settings)
        #[arg(long, value_name = "MS")]
        debounce: Option<u64>,

        /// Only log warnings and errors
        #[arg(short, long)]
        quiet: bool,

        /// Skip the full aggregation before watching
        #[arg(long)]
        skip_initial: bool,
    },

    /// List documented packages
    #[command(about = "List documented packages with their source and visible sections")]
    List {
        /// Build mode deciding which publication statuses are visible
        #[arg(long, value_enum, default_value_t = BuildMode::Dev)]
        mode: BuildMode,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .docgen/settings.toml")]
    Config,
}

impl Commands {
    pub fn is_quiet(&self) -> bool {
        matches!(self, Commands::Watch { quiet: true, .. })
    }
}
