//! Building one package into its output subtree.
//!
//! Shared by the batch aggregator and the incremental rebuilder: both call
//! [`build_package`], which reloads the package's config from disk, clears
//! the package's output directory and regenerates it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::assets::{copy_assets, remove_dir_if_exists};
use super::collection::{build_collection, collection_dirs};
use super::error::{AggregateError, AggregateResult};
use super::generator::ContentGenerator;
use super::paths::{authored_relative, package_prefix};
use super::transform::{self, OutputFormat};
use crate::discovery::Workspace;
use crate::manifest::{ConceptEntry, PackageManifest, SectionEntry, WebsiteSection};
use crate::package::{ConceptManifest, DocConfig, Section, concept};
use crate::source::{ContentRoot, SourceLocator};
use crate::status::{BuildMode, included};

/// Concept files sort after regular sections.
pub const CONCEPT_ORDER_BASE: i64 = 10_000;

/// Order slots reserved per concept.
const CONCEPT_ORDER_STRIDE: i64 = 100;

/// Changelog filename in a package directory.
pub const CHANGELOG_SOURCE: &str = "CHANGELOG.md";

/// Changelog filename in the output tree.
pub const CHANGELOG_OUTPUT: &str = "changelog.md";

/// Everything a unit build needs besides the unit itself.
#[derive(Clone)]
pub struct BuildContext {
    pub output_root: PathBuf,
    pub mode: BuildMode,
    pub format: OutputFormat,
    pub base_url: String,
    pub locator: SourceLocator,
    pub generator: Arc<dyn ContentGenerator>,
}

impl BuildContext {
    pub(crate) fn transform(&self, content: &str, prefix: &str) -> String {
        transform::apply(self.format, content, &self.base_url, prefix)
    }
}

/// Result of building one package.
#[derive(Debug)]
pub enum PackageBuild {
    /// Neither candidate root holds a config.
    NoConfig,
    /// `enabled: false`.
    Disabled,
    /// No section survived the status filter.
    Empty,
    /// Regular package written to its own subdirectory.
    Built(PackageManifest),
    /// Sections-mode package: one entry per visible sub-collection.
    Collections(Vec<WebsiteSection>),
}

/// Output subdirectory name for a package.
pub fn output_name(workspace: &Workspace, config: &DocConfig) -> String {
    config
        .settings
        .output_dir
        .clone()
        .unwrap_or_else(|| workspace.name.clone())
}

/// Build `workspace` into `ctx.output_root`.
///
/// Section-level failures are logged and the section left out; the
/// returned error covers failures of the package as a whole.
pub fn build_package(ctx: &BuildContext, workspace: &Workspace) -> AggregateResult<PackageBuild> {
    let Some(root) = ctx.locator.resolve(workspace) else {
        return Ok(PackageBuild::NoConfig);
    };
    let config = DocConfig::load(&root.config_path())?;

    if !config.enabled {
        return Ok(PackageBuild::Disabled);
    }

    if config.is_sections_mode() {
        return Ok(PackageBuild::Collections(build_collections(ctx, &root)));
    }

    let prefix = output_name(workspace, &config);
    let package_dir = ctx.output_root.join(package_prefix("output directory", &prefix)?);
    remove_dir_if_exists(&package_dir)?;

    let visible = config.visible_sections(ctx.mode);
    if visible.is_empty() {
        return Ok(PackageBuild::Empty);
    }

    let mut sections = Vec::with_capacity(visible.len());
    for section in visible {
        match write_section(ctx, workspace, &root, section, &package_dir, &prefix) {
            Ok(entry) => sections.push(entry),
            Err(e) => tracing::warn!("[aggregate] {}: skipping section '{}': {e}", workspace.key(), section.name),
        }
    }

    if sections.is_empty() {
        return Ok(PackageBuild::Empty);
    }

    let (concept_sections, concepts) = write_concepts(ctx, &root, &package_dir, &prefix);
    sections.extend(concept_sections);

    copy_assets(&ctx.locator, workspace, &package_dir)?;
    let changelog = copy_changelog(workspace, &package_dir, &prefix)?;

    crate::log_event!(
        "aggregate",
        "built",
        "{} ({} sections, {} concepts, {} root)",
        workspace.key(),
        sections.len(),
        concepts.len(),
        root.kind
    );

    Ok(PackageBuild::Built(PackageManifest {
        name: workspace.name.clone(),
        ecosystem: workspace.ecosystem.clone(),
        title: config.title_or(&workspace.name).to_string(),
        description: config.description.clone(),
        category: config.category.clone(),
        source: root.kind,
        path: prefix,
        sections,
        changelog,
        concepts,
    }))
}

/// Read (or first generate) a section's source and write it out.
pub(crate) fn write_section(
    ctx: &BuildContext,
    workspace: &Workspace,
    root: &ContentRoot,
    section: &Section,
    dest_dir: &Path,
    prefix: &str,
) -> AggregateResult<SectionEntry> {
    let output = authored_relative("section output", &section.output)?;
    if section.kind.generated_in_place() {
        ctx.generator.generate(root, workspace, section)?;
    }

    let source = root.join(output);
    let content = read_source(&source, &section.name)?;
    let content = transform::strip_leading_lines(&content, section.strip_lines.unwrap_or(0));
    let content = ctx.transform(&content, prefix);

    let dest = dest_dir.join(output);
    write_output(&dest, &content)?;

    Ok(SectionEntry {
        name: section.name.clone(),
        title: section.display_title().to_string(),
        order: section.order,
        file: format!("{prefix}/{}", section.output),
        status: section.effective_status(),
        concept: None,
    })
}

fn write_concepts(
    ctx: &BuildContext,
    root: &ContentRoot,
    package_dir: &Path,
    prefix: &str,
) -> (Vec<SectionEntry>, Vec<ConceptEntry>) {
    let mut sections = Vec::new();
    let mut concepts = Vec::new();

    for (index, dir) in concept::concept_dirs(&root.base).into_iter().enumerate() {
        let manifest = match ConceptManifest::load(&dir.join(concept::CONCEPT_MANIFEST)) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("[aggregate] skipping concept: {e}");
                continue;
            }
        };
        if !included(manifest.docgen_publish, ctx.mode) {
            crate::debug_event!("aggregate", "concept hidden", "{} ({})", manifest.id, manifest.docgen_publish);
            continue;
        }

        if let Err(e) = authored_relative("concept id", &manifest.id) {
            tracing::warn!("[aggregate] skipping concept in {}: {e}", dir.display());
            continue;
        }

        let base_order = CONCEPT_ORDER_BASE + index as i64 * CONCEPT_ORDER_STRIDE;
        let concept_prefix = format!("{}/{}", concept::CONCEPTS_DIR, manifest.id);
        let mut files = Vec::new();

        for (position, file) in manifest.ordered_files(&dir).into_iter().enumerate() {
            if let Err(e) = authored_relative("concept file", &file) {
                tracing::warn!("[aggregate] concept '{}': {e}", manifest.id);
                continue;
            }
            let content = match read_source(&dir.join(&file), &file) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("[aggregate] concept '{}': {e}", manifest.id);
                    continue;
                }
            };
            let dest = package_dir.join(&concept_prefix).join(&file);
            if let Err(e) = write_output(&dest, &ctx.transform(&content, prefix)) {
                tracing::warn!("[aggregate] concept '{}': {e}", manifest.id);
                continue;
            }

            let relative = format!("{prefix}/{concept_prefix}/{file}");
            sections.push(SectionEntry {
                name: format!("{}/{}", manifest.id, file.trim_end_matches(".md")),
                title: file_title(&file),
                order: base_order + position as i64,
                file: relative.clone(),
                status: manifest.docgen_publish,
                concept: Some(manifest.id.clone()),
            });
            files.push(relative);
        }

        concepts.push(ConceptEntry {
            title: manifest.title.clone().unwrap_or_else(|| manifest.id.clone()),
            description: manifest.description.clone(),
            status: manifest.docgen_publish,
            id: manifest.id,
            files,
        });
    }

    (sections, concepts)
}

fn copy_changelog(
    workspace: &Workspace,
    package_dir: &Path,
    prefix: &str,
) -> AggregateResult<Option<String>> {
    let source = workspace.path.join(CHANGELOG_SOURCE);
    if !source.is_file() {
        return Ok(None);
    }
    let dest = package_dir.join(CHANGELOG_OUTPUT);
    fs::copy(&source, &dest).map_err(|e| AggregateError::io(&dest, e))?;
    Ok(Some(format!("{prefix}/{CHANGELOG_OUTPUT}")))
}

fn build_collections(ctx: &BuildContext, root: &ContentRoot) -> Vec<WebsiteSection> {
    let mut built = Vec::new();
    for dir in collection_dirs(&root.base) {
        match build_collection(ctx, &dir) {
            Ok(Some(section)) => built.push(section),
            Ok(None) => {}
            Err(e) => tracing::warn!("[aggregate] skipping collection {}: {e}", dir.display()),
        }
    }
    built
}

pub(crate) fn read_source(path: &Path, name: &str) -> AggregateResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AggregateError::MissingSource {
            section: name.to_string(),
            path: path.to_path_buf(),
        },
        _ => AggregateError::io(path, e),
    })
}

pub(crate) fn write_output(dest: &Path, content: &str) -> AggregateResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| AggregateError::io(parent, e))?;
    }
    fs::write(dest, content).map_err(|e| AggregateError::io(dest, e))
}

/// Human title from a filename: `getting-started.md` becomes `Getting started`.
pub(crate) fn file_title(file: &str) -> String {
    let stem = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().replace(['-', '_'], " "))
        .unwrap_or_default();
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => stem,
    }
}
