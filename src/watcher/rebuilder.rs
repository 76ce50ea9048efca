//! Per-owner incremental rebuilds into the live output tree.
//!
//! Each watched owner is either a package or a sections-mode collection.
//! A rebuild reloads the unit's config from disk, regenerates its output
//! subtree through the same builders the batch run uses, and patches the
//! on-disk manifest in place.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use super::error::WatchError;
use super::handler::{RebuildOutcome, UnitRebuilder};
use crate::aggregate::assets::remove_dir_if_exists;
use crate::aggregate::collection::{collection_dirs, collection_name, collection_output};
use crate::aggregate::paths::package_prefix;
use crate::aggregate::{AggregateError, BuildContext, PackageBuild, build_collection, build_package};
use crate::discovery::{DiscoveryResult, Workspace};
use crate::manifest::{Manifest, WebsiteSection};
use crate::package::{CONFIG_FILENAME, DocConfig, SidebarConfig};
use crate::source::SourceLocator;

/// What a watched owner rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitShape {
    Package(Workspace),
    Collection { dir: PathBuf },
}

/// An owner key together with the roots that feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedUnit {
    pub owner: String,
    pub shape: UnitShape,
    /// Directories to cover; they need not exist yet.
    pub roots: Vec<PathBuf>,
}

impl WatchedUnit {
    pub fn package_owner(workspace: &Workspace) -> String {
        format!("pkg:{}", workspace.key())
    }

    pub fn collection_owner(name: &str) -> String {
        format!("col:{name}")
    }

    /// Package unit covering both candidate roots.
    pub fn package(workspace: &Workspace, locator: &SourceLocator) -> Self {
        Self {
            owner: Self::package_owner(workspace),
            roots: vec![locator.authoring_dir(workspace), locator.legacy_dir(workspace)],
            shape: UnitShape::Package(workspace.clone()),
        }
    }

    pub fn collection(dir: &Path) -> Self {
        Self {
            owner: Self::collection_owner(&collection_name(dir)),
            roots: vec![dir.to_path_buf()],
            shape: UnitShape::Collection {
                dir: dir.to_path_buf(),
            },
        }
    }

    /// Units for every package in scope, plus one per existing collection
    /// of sections-mode packages.
    ///
    /// Packages outside the sidebar allow-list are left out. Packages
    /// without any config are still watched so a config created later is
    /// picked up.
    pub fn plan(discovery: &DiscoveryResult, ctx: &BuildContext) -> Vec<Self> {
        let allowed = discovery
            .local_config
            .as_ref()
            .and_then(|config| config.sidebar.as_ref())
            .and_then(|sidebar| sidebar.allowed_packages(ctx.mode));

        let mut units = Vec::new();
        for workspace in &discovery.workspaces {
            if allowed.as_ref().is_some_and(|a| !a.contains(&workspace.name)) {
                continue;
            }
            units.push(Self::package(workspace, &ctx.locator));

            let Some(root) = ctx.locator.resolve(workspace) else {
                continue;
            };
            let sections_mode = DocConfig::load(&root.config_path())
                .map(|config| config.is_sections_mode())
                .unwrap_or(false);
            if sections_mode {
                units.extend(collection_dirs(&root.base).iter().map(|dir| Self::collection(dir)));
            }
        }
        units
    }
}

/// [`UnitRebuilder`] writing into a live output tree.
pub struct IncrementalRebuilder {
    ctx: BuildContext,
    units: RwLock<HashMap<String, WatchedUnit>>,
    /// Collections last produced by each sections-mode package owner.
    package_collections: Mutex<HashMap<String, BTreeSet<String>>>,
    sidebar: Option<SidebarConfig>,
}

impl IncrementalRebuilder {
    pub fn new(ctx: BuildContext, sidebar: Option<SidebarConfig>) -> Self {
        Self {
            ctx,
            units: RwLock::new(HashMap::new()),
            package_collections: Mutex::new(HashMap::new()),
            sidebar,
        }
    }

    pub fn register(&self, unit: WatchedUnit) {
        if let UnitShape::Package(workspace) = &unit.shape {
            let root = self.ctx.locator.resolve(workspace).filter(|root| {
                DocConfig::load(&root.config_path()).is_ok_and(|c| c.is_sections_mode())
            });
            if let Some(root) = root {
                let names = collection_dirs(&root.base)
                    .iter()
                    .map(|dir| collection_name(dir))
                    .collect();
                self.package_collections.lock().insert(unit.owner.clone(), names);
            }
        }
        self.units.write().insert(unit.owner.clone(), unit);
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn unit(&self, owner: &str) -> Option<WatchedUnit> {
        self.units.read().get(owner).cloned()
    }

    fn rebuild_package(
        &self,
        owner: &str,
        workspace: &Workspace,
        manifest: &mut Manifest,
    ) -> Result<RebuildOutcome, AggregateError> {
        let build = build_package(&self.ctx, workspace)?;

        let previous_dir = manifest
            .packages
            .iter()
            .find(|p| p.name == workspace.name && p.ecosystem == workspace.ecosystem)
            .map(|p| p.path.clone());

        let (entry, collections) = match build {
            PackageBuild::Built(entry) => (Some(entry), Vec::new()),
            PackageBuild::Collections(sections) => (None, sections),
            PackageBuild::NoConfig | PackageBuild::Disabled | PackageBuild::Empty => {
                (None, Vec::new())
            }
        };

        // The output directory may have been renamed or emptied.
        if let Some(dir) = previous_dir {
            if entry.as_ref().is_none_or(|e| e.path != dir) {
                match package_prefix("manifest package path", &dir) {
                    Ok(relative) => remove_dir_if_exists(&self.ctx.output_root.join(relative))?,
                    Err(e) => tracing::warn!("[watcher] not removing previous output: {e}"),
                }
            }
        }

        let produced = usize::from(entry.is_some()) + collections.len();
        manifest.upsert_package(&workspace.ecosystem, &workspace.name, entry);
        self.replace_collections(owner, manifest, collections)?;

        Ok(if produced == 0 {
            RebuildOutcome::Removed
        } else {
            RebuildOutcome::Written { entries: produced }
        })
    }

    /// Swap the collections a package owner produced last time for `now`.
    fn replace_collections(
        &self,
        owner: &str,
        manifest: &mut Manifest,
        now: Vec<WebsiteSection>,
    ) -> Result<(), AggregateError> {
        let names: BTreeSet<String> = now.iter().map(|s| s.name.clone()).collect();
        let previous = self
            .package_collections
            .lock()
            .insert(owner.to_string(), names.clone())
            .unwrap_or_default();

        for stale in previous.difference(&names) {
            remove_dir_if_exists(&collection_output(&self.ctx, stale))?;
            manifest.upsert_website_section(stale, None);
        }
        for section in now {
            let name = section.name.clone();
            manifest.upsert_website_section(&name, Some(section));
        }
        Ok(())
    }

    fn rebuild_collection(
        &self,
        dir: &Path,
        manifest: &mut Manifest,
    ) -> Result<RebuildOutcome, AggregateError> {
        let name = collection_name(dir);
        let built = if dir.join(CONFIG_FILENAME).is_file() {
            build_collection(&self.ctx, dir)?
        } else {
            remove_dir_if_exists(&collection_output(&self.ctx, &name))?;
            None
        };

        let outcome = match &built {
            Some(section) => RebuildOutcome::Written {
                entries: section.files.len(),
            },
            None => RebuildOutcome::Removed,
        };
        manifest.upsert_website_section(&name, built);
        Ok(outcome)
    }
}

impl UnitRebuilder for IncrementalRebuilder {
    fn rebuild(&self, owner: &str) -> Result<RebuildOutcome, WatchError> {
        let unit = self.unit(owner).ok_or_else(|| WatchError::UnknownOwner {
            owner: owner.to_string(),
        })?;

        let mut manifest = Manifest::load_or_new(&self.ctx.output_root, self.ctx.mode);
        let result = match &unit.shape {
            UnitShape::Package(workspace) => self.rebuild_package(owner, workspace, &mut manifest),
            UnitShape::Collection { dir } => self.rebuild_collection(dir, &mut manifest),
        };
        let outcome = result.map_err(|source| WatchError::RebuildFailed {
            owner: owner.to_string(),
            source,
        })?;

        manifest.generated_at = chrono::Utc::now();
        manifest.sidebar = self.sidebar.as_ref().map(|s| s.filtered(self.ctx.mode));
        manifest.normalize();
        manifest.write(&self.ctx.output_root)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{CommandCapture, OutputFormat};
    use crate::status::BuildMode;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ctx(temp: &TempDir) -> BuildContext {
        BuildContext {
            output_root: temp.path().join("site"),
            mode: BuildMode::Prod,
            format: OutputFormat::Website,
            base_url: "/docs".to_string(),
            locator: SourceLocator::new(temp.path().join("authoring")),
            generator: Arc::new(CommandCapture),
        }
    }

    fn workspace(temp: &TempDir) -> Workspace {
        let path = temp.path().join("repo/packages/core");
        fs::create_dir_all(path.join("docs")).unwrap();
        Workspace::new(path, "repo")
    }

    fn write_config(ws: &Workspace, status: &str) {
        fs::write(
            ws.path.join("docs").join(CONFIG_FILENAME),
            format!("sections:\n  - {{ name: intro, status: {status}, output: intro.md }}\n"),
        )
        .unwrap();
        fs::write(ws.path.join("docs/intro.md"), "# Intro").unwrap();
    }

    #[test]
    fn test_rebuild_reloads_config_each_time() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        write_config(&ws, "production");

        let ctx = ctx(&temp);
        let rebuilder = IncrementalRebuilder::new(ctx.clone(), None);
        let unit = WatchedUnit::package(&ws, &ctx.locator);
        let owner = unit.owner.clone();
        rebuilder.register(unit);

        assert_eq!(
            rebuilder.rebuild(&owner).unwrap(),
            RebuildOutcome::Written { entries: 1 }
        );
        let manifest = Manifest::load(&Manifest::path_in(&ctx.output_root)).unwrap();
        assert_eq!(manifest.packages.len(), 1);
        assert!(ctx.output_root.join("core/intro.md").is_file());

        write_config(&ws, "dev");
        assert_eq!(rebuilder.rebuild(&owner).unwrap(), RebuildOutcome::Removed);
        let manifest = Manifest::load(&Manifest::path_in(&ctx.output_root)).unwrap();
        assert!(manifest.packages.is_empty());
        assert!(!ctx.output_root.join("core").exists());
    }

    #[test]
    fn test_rebuild_keeps_other_entries() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        write_config(&ws, "production");
        let ctx = ctx(&temp);

        let mut existing = Manifest::new(BuildMode::Prod);
        existing.upsert_website_section(
            "guides",
            Some(WebsiteSection {
                name: "guides".to_string(),
                title: "Guides".to_string(),
                description: None,
                order: 0,
                path: "sections/guides".to_string(),
                files: Vec::new(),
            }),
        );
        fs::create_dir_all(&ctx.output_root).unwrap();
        existing.write(&ctx.output_root).unwrap();

        let rebuilder = IncrementalRebuilder::new(ctx.clone(), None);
        rebuilder.register(WatchedUnit::package(&ws, &ctx.locator));
        rebuilder.rebuild("pkg:repo/core").unwrap();

        let manifest = Manifest::load(&Manifest::path_in(&ctx.output_root)).unwrap();
        assert_eq!(manifest.packages.len(), 1);
        assert_eq!(manifest.website_sections.len(), 1);
    }

    #[test]
    fn test_unknown_owner() {
        let temp = TempDir::new().unwrap();
        let rebuilder = IncrementalRebuilder::new(ctx(&temp), None);
        assert!(matches!(
            rebuilder.rebuild("pkg:nope/x"),
            Err(WatchError::UnknownOwner { .. })
        ));
    }

    #[test]
    fn test_plan_includes_collections() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        fs::write(
            ws.path.join("docs").join(CONFIG_FILENAME),
            "settings:\n  output_mode: sections\n",
        )
        .unwrap();
        fs::create_dir_all(ws.path.join("docs/guides")).unwrap();
        fs::write(ws.path.join("docs/guides").join(CONFIG_FILENAME), "").unwrap();

        let ctx = ctx(&temp);
        let discovery = DiscoveryResult {
            current: crate::discovery::Ecosystem {
                name: "repo".to_string(),
                root: temp.path().join("repo"),
                patterns: vec!["packages/*".to_string()],
            },
            ecosystems: Vec::new(),
            workspaces: vec![ws.clone()],
            local_config: None,
        };

        let units = WatchedUnit::plan(&discovery, &ctx);
        let owners: Vec<_> = units.iter().map(|u| u.owner.as_str()).collect();
        assert_eq!(owners, vec!["pkg:repo/core", "col:guides"]);
        assert_eq!(units[0].roots[1], ws.path.join("docs"));
    }

    #[test]
    fn test_collection_rebuild_by_frontmatter() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("repo/packages/site/docs/guides");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILENAME), "title: Guides\n").unwrap();
        fs::write(dir.join("a.md"), "# A").unwrap();
        fs::write(dir.join("b.md"), "---\nstatus: dev\n---\n# B").unwrap();

        let ctx = ctx(&temp);
        let rebuilder = IncrementalRebuilder::new(ctx.clone(), None);
        rebuilder.register(WatchedUnit::collection(&dir));

        assert_eq!(
            rebuilder.rebuild("col:guides").unwrap(),
            RebuildOutcome::Written { entries: 1 }
        );
        assert!(ctx.output_root.join("sections/guides/a.md").is_file());
        assert!(!ctx.output_root.join("sections/guides/b.md").exists());

        fs::write(dir.join("b.md"), "---\nstatus: production\n---\n# B").unwrap();
        assert_eq!(
            rebuilder.rebuild("col:guides").unwrap(),
            RebuildOutcome::Written { entries: 2 }
        );
    }
}
