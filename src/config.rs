//! Application settings.
//!
//! Layered with figment:
//! - Default values
//! - TOML file (`.docgen/settings.toml`, found by walking up from the
//!   current directory, or an explicit `--config` path)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables are prefixed with `DOCGEN_` and use double
//! underscores to separate nested levels:
//! - `DOCGEN_AUTHORING_ROOT=/srv/docs` sets `authoring_root`
//! - `DOCGEN_WATCH__DEBOUNCE_MS=500` sets `watch.debounce_ms`
//! - `DOCGEN_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Directory holding the settings file.
pub const SETTINGS_DIR: &str = ".docgen";

/// Settings filename inside [`SETTINGS_DIR`].
pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Base of the authoring location; packages live at
    /// `<authoring_root>/<ecosystem>/<package>`.
    #[serde(default = "default_authoring_root")]
    pub authoring_root: PathBuf,

    /// Directory containing `.docgen` (detected when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Explicit roots for named ecosystems. Relative paths resolve against
    /// the current ecosystem root.
    #[serde(default)]
    pub ecosystem_roots: BTreeMap<String, PathBuf>,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub website: WebsiteConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Quiet interval before a burst of edits is rebuilt
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebsiteConfig {
    /// URL prefix used when rewriting asset links for the website format
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Log level configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_base_url() -> String {
    "/docs".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_authoring_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(SETTINGS_DIR).join("authoring"))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_DIR).join("authoring"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            authoring_root: default_authoring_root(),
            workspace_root: None,
            ecosystem_roots: BTreeMap::new(),
            watch: WatchConfig::default(),
            website: WebsiteConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(SETTINGS_DIR).join(SETTINGS_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nesting levels; single underscores
            // stay inside field names.
            .merge(
                Env::prefixed("DOCGEN_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
    }

    /// Find `.docgen/settings.toml` from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Get the directory where `.docgen` is located
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(SETTINGS_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured ecosystem root against `base`.
    pub fn ecosystem_root(&self, name: &str, base: &Path) -> Option<PathBuf> {
        self.ecosystem_roots.get(name).map(|root| {
            if root.is_absolute() {
                root.clone()
            } else {
                base.join(root)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.watch.debounce_ms, 300);
        assert_eq!(settings.logging.default, "info");
        assert!(settings.authoring_root.ends_with(".docgen/authoring"));
        assert!(settings.ecosystem_roots.is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
authoring_root = "/srv/authoring"

[ecosystem_roots]
tools = "../tools"

[watch]
debounce_ms = 750

[logging]
default = "debug"

[logging.modules]
watcher = "trace"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.authoring_root, PathBuf::from("/srv/authoring"));
        assert_eq!(settings.watch.debounce_ms, 750);
        assert_eq!(settings.logging.default, "debug");
        assert_eq!(settings.logging.modules["watcher"], "trace");
        assert_eq!(
            settings.ecosystem_root("tools", Path::new("/repo/main")),
            Some(PathBuf::from("/repo/main/../tools"))
        );
        assert_eq!(settings.ecosystem_root("other", Path::new("/repo")), None);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        fs::write(&config_path, "[watch]\ndebounce_ms = 50\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        assert_eq!(settings.watch.debounce_ms, 50);
        // Defaults remain for everything else
        assert_eq!(settings.version, 1);
        assert_eq!(settings.logging.default, "info");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.version, 1);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[website]\nbase_url = \"/from-file\"\n").unwrap();

        // Only this test touches this variable.
        unsafe {
            std::env::set_var("DOCGEN_WEBSITE__BASE_URL", "/from-env");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("DOCGEN_WEBSITE__BASE_URL");
        }

        assert_eq!(settings.website.base_url, "/from-env");
    }
}
