//! End-to-end watch tests over the platform notify backend.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use docgen::aggregate::{Aggregator, BuildContext, CommandCapture, OutputFormat};
use docgen::manifest::Manifest;
use docgen::watcher::{IncrementalRebuilder, LiveWatcher, WatchedUnit};
use docgen::{BuildMode, Settings, SourceLocator, discover};
use tempfile::TempDir;
use tokio::task::JoinHandle;

const CONFIG: &str = "sections:\n  - { name: intro, status: production, output: intro.md }\n";

struct Site {
    _temp: TempDir,
    base: PathBuf,
    watcher: Option<JoinHandle<()>>,
}

impl Site {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        // notify reports canonical paths
        let base = temp.path().canonicalize().unwrap();
        let repo = base.join("repo");
        fs::create_dir_all(repo.join("packages/core/docs")).unwrap();
        fs::write(
            repo.join("package.json"),
            r#"{ "name": "repo", "workspaces": ["packages/*"] }"#,
        )
        .unwrap();
        fs::write(repo.join("packages/core/docs/docgen.config.yml"), CONFIG).unwrap();
        fs::write(repo.join("packages/core/docs/intro.md"), "# Intro v1").unwrap();
        Self {
            _temp: temp,
            base,
            watcher: None,
        }
    }

    fn docs(&self) -> PathBuf {
        self.base.join("repo/packages/core/docs")
    }

    fn out(&self) -> PathBuf {
        self.base.join("out")
    }

    fn start(&mut self, mode: BuildMode) {
        let authoring = self.base.join("authoring");
        let settings = Settings {
            authoring_root: authoring.clone(),
            ..Settings::default()
        };
        let locator = SourceLocator::new(authoring);
        let discovery = discover(&self.base.join("repo"), &settings, &locator).unwrap();
        let ctx = BuildContext {
            output_root: self.out(),
            mode,
            format: OutputFormat::Website,
            base_url: settings.website.base_url.clone(),
            locator,
            generator: Arc::new(CommandCapture),
        };
        Aggregator::new(ctx.clone()).run(&discovery).unwrap();

        let units = WatchedUnit::plan(&discovery, &ctx);
        let rebuilder = Arc::new(IncrementalRebuilder::new(ctx, None));
        let watcher = LiveWatcher::new(rebuilder, units, 50).unwrap();
        self.watcher = Some(tokio::spawn(async move {
            watcher.watch().await.unwrap();
        }));
    }

    fn manifest(&self) -> Manifest {
        Manifest::load(&Manifest::path_in(&self.out())).unwrap()
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
    }
}

async fn wait_for(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for {what}");
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edit_rebuilds_section() {
    let mut site = Site::new();
    site.start(BuildMode::Prod);
    let output = site.out().join("core/intro.md");
    assert!(read(&output).contains("Intro v1"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(site.docs().join("intro.md"), "# Intro v2").unwrap();

    wait_for("rebuilt section", || read(&output).contains("Intro v2")).await;
    assert_eq!(site.manifest().packages.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_concept_directory_is_picked_up() {
    let mut site = Site::new();
    site.start(BuildMode::Prod);
    assert!(site.manifest().packages[0].concepts.is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let concept = site.docs().join("concepts/routing");
    fs::create_dir_all(&concept).unwrap();
    fs::write(
        concept.join("concept.yml"),
        "id: routing\ntitle: Routing\ndocgen_publish: production\n",
    )
    .unwrap();
    fs::write(concept.join("basics.md"), "# Basics").unwrap();

    wait_for("concept in manifest", || {
        site.manifest()
            .packages
            .first()
            .is_some_and(|p| p.concepts.len() == 1)
    })
    .await;
    assert!(site.out().join("core/concepts/routing/basics.md").is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_demoted_package_is_removed() {
    let mut site = Site::new();
    site.start(BuildMode::Prod);
    assert!(site.out().join("core").is_dir());

    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(
        site.docs().join("docgen.config.yml"),
        CONFIG.replace("production", "dev"),
    )
    .unwrap();

    wait_for("package removal", || site.manifest().packages.is_empty()).await;
    assert!(!site.out().join("core").exists());
}
