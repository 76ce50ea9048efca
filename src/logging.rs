//! Diagnostics for aggregation and watch runs.
//!
//! Everything goes to stderr so stdout stays clean for command output
//! (`list`, `config`, the aggregate summary). Levels come from the
//! `[logging]` settings, adjusted by the command line's verbosity, and
//! `RUST_LOG` replaces both when set:
//!
//! ```toml
//! [logging]
//! default = "info"
//!
//! [logging.modules]
//! "docgen::watcher" = "debug"
//! ```
//!
//! Components log through [`log_event!`](crate::log_event) and
//! [`debug_event!`](crate::debug_event), which tag each line with the
//! component name and record it as a `component` field.

use std::sync::Once;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INSTALLED: Once = Once::new();

/// How chatty a command asked to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// `watch --quiet`: warnings and errors only.
    Quiet,
    /// Levels exactly as configured.
    Normal,
    /// `--info`: everything down to debug.
    Verbose,
}

impl Verbosity {
    pub fn from_flags(info: bool, quiet: bool) -> Self {
        match (info, quiet) {
            (true, _) => Self::Verbose,
            (false, true) => Self::Quiet,
            (false, false) => Self::Normal,
        }
    }
}

/// Filter directives: the default level (possibly overridden by
/// `verbosity`) followed by per-module levels in a stable order.
///
/// Quiet still honours module levels stricter than `warn`; verbose drops
/// them so nothing is hidden.
pub fn directives(config: &LoggingConfig, verbosity: Verbosity) -> String {
    let default = match verbosity {
        Verbosity::Quiet => "warn",
        Verbosity::Normal => config.default.as_str(),
        Verbosity::Verbose => return "debug".to_string(),
    };

    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();
    modules
        .into_iter()
        .filter(|(_, level)| verbosity != Verbosity::Quiet || is_stricter_than_warn(level))
        .fold(default.to_string(), |mut acc, (module, level)| {
            acc.push_str(&format!(",{module}={level}"));
            acc
        })
}

fn is_stricter_than_warn(level: &str) -> bool {
    matches!(level.to_ascii_lowercase().as_str(), "error" | "off")
}

fn clock(w: &mut Writer<'_>) -> std::fmt::Result {
    write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_with_config(config: &LoggingConfig, verbosity: Verbosity) {
    INSTALLED.call_once(|| {
        let filter = match std::env::var("RUST_LOG") {
            Ok(_) => EnvFilter::from_default_env(),
            Err(_) => EnvFilter::new(directives(config, verbosity)),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(clock as fn(&mut Writer<'_>) -> std::fmt::Result)
            .with_filter(filter);

        tracing_subscriber::registry().with(layer).init();
    });
}

/// Info-level event tagged with its component.
///
/// ```ignore
/// log_event!("aggregate", "built", "{} ({} sections)", key, count);
/// log_event!("watcher", "interrupted");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!(component = $component, "[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!(component = $component, "[{}] {}: {}", $component, $event, format_args!($($arg)*))
    };
}

/// Debug-level counterpart of [`log_event!`](crate::log_event).
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!(component = $component, "[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!(component = $component, "[{}] {}: {}", $component, $event, format_args!($($arg)*))
    };
}
