//! Workspace and ecosystem discovery.
//!
//! Discovery starts from the ecosystem enclosing the working directory. Its
//! root config (resolved through the [`SourceLocator`] like any package)
//! may list further ecosystems to aggregate; without such a list only the
//! current ecosystem is used. Every ecosystem's workspace patterns are then
//! expanded into package directories.

mod ecosystem;
mod error;
mod workspace;

pub use ecosystem::Ecosystem;
pub(crate) use ecosystem::dir_name;
pub use error::DiscoveryError;
pub use workspace::{Workspace, expand};

use std::collections::HashMap;
use std::path::Path;

use crate::config::Settings;
use crate::package::DocConfig;
use crate::source::SourceLocator;

/// Everything a run needs to know about the packages in scope.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    /// The ecosystem enclosing the start directory.
    pub current: Ecosystem,
    /// Ecosystems in scope, current one included when listed.
    pub ecosystems: Vec<Ecosystem>,
    /// Package directories across all ecosystems, in discovery order.
    pub workspaces: Vec<Workspace>,
    /// Config of the current ecosystem root, when it has one.
    pub local_config: Option<DocConfig>,
}

/// Discover ecosystems and their workspaces starting at `start`.
///
/// Fails only when no ecosystem encloses `start`.
pub fn discover(
    start: &Path,
    settings: &Settings,
    locator: &SourceLocator,
) -> Result<DiscoveryResult, DiscoveryError> {
    let current = Ecosystem::locate(start)?;
    crate::debug_event!(
        "discovery",
        "current ecosystem",
        "{} at {}",
        current.name,
        current.root.display()
    );

    let local_config = load_local_config(&current, locator);
    let requested = local_config
        .as_ref()
        .and_then(|config| config.settings.ecosystems.clone());

    let ecosystems = match requested {
        Some(names) if !names.is_empty() => resolve_named(&names, &current, settings),
        _ => {
            tracing::warn!(
                "[discovery] no ecosystems listed in the local config; aggregating only '{}'",
                current.name
            );
            vec![current.clone()]
        }
    };

    let mut workspaces = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();
    for eco in &ecosystems {
        let found = expand(eco);
        crate::log_event!("discovery", "ecosystem", "{} ({} workspaces)", eco.name, found.len());
        for ws in found {
            if let Some(first) = seen.get(&ws.name) {
                tracing::warn!(
                    "[discovery] package '{}' exists in both '{}' and '{}'; outputs will collide",
                    ws.name,
                    first,
                    ws.ecosystem
                );
            } else {
                seen.insert(ws.name.clone(), ws.ecosystem.clone());
            }
            workspaces.push(ws);
        }
    }

    Ok(DiscoveryResult {
        current,
        ecosystems,
        workspaces,
        local_config,
    })
}

/// The ecosystem root treated as a package named after the ecosystem.
pub fn root_workspace(ecosystem: &Ecosystem) -> Workspace {
    Workspace {
        name: ecosystem.name.clone(),
        path: ecosystem.root.clone(),
        ecosystem: ecosystem.name.clone(),
    }
}

fn load_local_config(current: &Ecosystem, locator: &SourceLocator) -> Option<DocConfig> {
    let root = locator.resolve(&root_workspace(current))?;
    match DocConfig::load(&root.config_path()) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("[discovery] ignoring local config: {e}");
            None
        }
    }
}

fn resolve_named(names: &[String], current: &Ecosystem, settings: &Settings) -> Vec<Ecosystem> {
    let mut resolved: Vec<Ecosystem> = Vec::new();

    for name in names {
        let eco = if *name == current.name {
            Ok(current.clone())
        } else {
            resolve_one(name, current, settings)
        };

        match eco {
            Ok(eco) if resolved.iter().any(|e| e.root == eco.root) => {
                crate::debug_event!("discovery", "duplicate ecosystem", "{name}");
            }
            Ok(eco) => resolved.push(eco),
            Err(e) => tracing::warn!("[discovery] skipping: {e}"),
        }
    }

    resolved
}

fn resolve_one(
    name: &str,
    current: &Ecosystem,
    settings: &Settings,
) -> Result<Ecosystem, DiscoveryError> {
    let candidate = settings
        .ecosystem_root(name, &current.root)
        .or_else(|| current.root.parent().map(|parent| parent.join(name)))
        .unwrap_or_else(|| current.root.join(name));

    match Ecosystem::from_root(&candidate)? {
        Some(mut eco) => {
            // Configured roots may use a different directory name.
            eco.name = name.to_string();
            Ok(eco)
        }
        None => Err(DiscoveryError::UnknownEcosystem {
            name: name.to_string(),
            looked: candidate,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::CONFIG_FILENAME;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn make_ecosystem(root: &Path, packages: &[&str]) {
        fs::create_dir_all(root).unwrap();
        fs::write(root.join("package.json"), r#"{ "workspaces": ["packages/*"] }"#).unwrap();
        for pkg in packages {
            fs::create_dir_all(root.join("packages").join(pkg)).unwrap();
        }
    }

    fn settings(authoring: PathBuf) -> Settings {
        Settings {
            authoring_root: authoring,
            ..Settings::default()
        }
    }

    #[test]
    fn test_fallback_to_current_ecosystem() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("main");
        make_ecosystem(&main, &["core", "cli"]);
        let settings = settings(temp.path().join("authoring"));
        let locator = SourceLocator::new(&settings.authoring_root);

        let result = discover(&main.join("packages/core"), &settings, &locator).unwrap();
        assert_eq!(result.current.name, "main");
        assert_eq!(result.ecosystems.len(), 1);
        let names: Vec<_> = result.workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["cli", "core"]);
        assert!(result.local_config.is_none());
    }

    #[test]
    fn test_named_ecosystems_with_unknown_skipped() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("main");
        let tools = temp.path().join("tools");
        make_ecosystem(&main, &["core"]);
        make_ecosystem(&tools, &["lint"]);
        fs::create_dir_all(main.join("docs")).unwrap();
        fs::write(
            main.join("docs").join(CONFIG_FILENAME),
            "settings:\n  ecosystems: [main, tools, missing]\n",
        )
        .unwrap();

        let settings = settings(temp.path().join("authoring"));
        let locator = SourceLocator::new(&settings.authoring_root);

        let result = discover(&main, &settings, &locator).unwrap();
        let ecos: Vec<_> = result.ecosystems.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(ecos, vec!["main", "tools"]);
        let keys: Vec<_> = result.workspaces.iter().map(|w| w.key()).collect();
        assert_eq!(keys, vec!["main/core", "tools/lint"]);
    }

    #[test]
    fn test_configured_ecosystem_root() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("main");
        let elsewhere = temp.path().join("nested").join("shared-repo");
        make_ecosystem(&main, &["core"]);
        make_ecosystem(&elsewhere, &["ui"]);
        fs::create_dir_all(main.join("docs")).unwrap();
        fs::write(
            main.join("docs").join(CONFIG_FILENAME),
            "settings:\n  ecosystems: [shared]\n",
        )
        .unwrap();

        let mut settings = settings(temp.path().join("authoring"));
        settings
            .ecosystem_roots
            .insert("shared".to_string(), PathBuf::from("../nested/shared-repo"));
        let locator = SourceLocator::new(&settings.authoring_root);

        let result = discover(&main, &settings, &locator).unwrap();
        assert_eq!(result.ecosystems.len(), 1);
        assert_eq!(result.ecosystems[0].name, "shared");
        assert_eq!(result.workspaces[0].key(), "shared/ui");
    }

    #[test]
    fn test_no_ecosystem_is_fatal() {
        let temp = TempDir::new().unwrap();
        let settings = settings(temp.path().join("authoring"));
        let locator = SourceLocator::new(&settings.authoring_root);

        assert!(matches!(
            discover(temp.path(), &settings, &locator),
            Err(DiscoveryError::NoEcosystem { .. })
        ));
    }
}
