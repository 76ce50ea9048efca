//! Sections-mode collections.
//!
//! A sections-mode package is a container: every immediate subdirectory of
//! its content root that holds a config file is a collection, built into
//! `<output>/sections/<collection>/` and listed under `website_sections`.
//!
//! Visibility uses one rule in every build path: a file listed in the
//! collection's `sections` takes that section's status, any other top-level
//! markdown file takes its frontmatter `status:` (production when absent).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::assets::{copy_assets_from, is_hidden, remove_dir_if_exists};
use super::error::AggregateResult;
use super::unit::{BuildContext, file_title, read_source, write_output};
use crate::discovery::Workspace;
use crate::manifest::{SectionEntry, WebsiteSection};
use crate::package::{CONFIG_FILENAME, DocConfig, frontmatter};
use crate::source::{ContentRoot, RootKind};
use crate::status::included;

/// Output directory holding every collection.
pub const SECTIONS_DIR: &str = "sections";

/// Order given to unlisted files without a frontmatter `order:`.
const UNLISTED_ORDER: i64 = 1_000_000;

/// Collection directories directly under a sections-mode content root.
pub fn collection_dirs(content_root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(content_root)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_dir() && !is_hidden(p) && p.join(CONFIG_FILENAME).is_file())
        .collect();
    dirs.sort();
    dirs
}

/// Name a collection is published under.
pub fn collection_name(dir: &Path) -> String {
    crate::discovery::dir_name(dir)
}

/// Output directory of a collection.
pub fn collection_output(ctx: &BuildContext, name: &str) -> PathBuf {
    ctx.output_root.join(SECTIONS_DIR).join(name)
}

/// Build one collection. `None` means nothing in it is visible (or it is
/// disabled); its output directory is removed in that case.
pub fn build_collection(ctx: &BuildContext, dir: &Path) -> AggregateResult<Option<WebsiteSection>> {
    let name = collection_name(dir);
    let prefix = format!("{SECTIONS_DIR}/{name}");
    let out = collection_output(ctx, &name);
    remove_dir_if_exists(&out)?;

    let config = DocConfig::load(&dir.join(CONFIG_FILENAME))?;
    if !config.enabled {
        return Ok(None);
    }

    let root = ContentRoot {
        kind: RootKind::Authoring,
        base: dir.to_path_buf(),
    };
    // Generators run in the collection directory itself.
    let workspace = Workspace::new(dir.to_path_buf(), "");
    let mut files = Vec::new();

    for section in config.visible_sections(ctx.mode) {
        match super::unit::write_section(ctx, &workspace, &root, section, &out, &prefix) {
            Ok(entry) => files.push(entry),
            Err(e) => tracing::warn!("[aggregate] collection '{name}': skipping '{}': {e}", section.name),
        }
    }

    let listed: HashSet<&str> = config.sections.iter().map(|s| s.output.as_str()).collect();
    for path in markdown_files(dir) {
        let file = crate::discovery::dir_name(&path);
        if listed.contains(file.as_str()) {
            continue;
        }
        match write_unlisted(ctx, &path, &file, &out, &prefix) {
            Ok(Some(entry)) => files.push(entry),
            Ok(None) => {}
            Err(e) => tracing::warn!("[aggregate] collection '{name}': skipping '{file}': {e}"),
        }
    }

    if files.is_empty() {
        remove_dir_if_exists(&out)?;
        return Ok(None);
    }

    copy_assets_from(dir, &out)?;
    files.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

    crate::log_event!("aggregate", "collection built", "{name} ({} files)", files.len());

    Ok(Some(WebsiteSection {
        title: config.title_or(&name).to_string(),
        description: config.description.clone(),
        order: config.order.unwrap_or(0),
        path: prefix,
        name,
        files,
    }))
}

/// Copy one unlisted file if its frontmatter makes it visible.
fn write_unlisted(
    ctx: &BuildContext,
    path: &Path,
    file: &str,
    out: &Path,
    prefix: &str,
) -> AggregateResult<Option<SectionEntry>> {
    let content = read_source(path, file)?;
    let meta = frontmatter::parse(&content, path)?;
    let status = meta.effective_status();
    if !included(status, ctx.mode) {
        crate::debug_event!("aggregate", "hidden", "{} ({status})", path.display());
        return Ok(None);
    }

    write_output(&out.join(file), &ctx.transform(&content, prefix))?;

    Ok(Some(SectionEntry {
        name: file.trim_end_matches(".md").to_string(),
        title: meta.title.unwrap_or_else(|| file_title(file)),
        order: meta.order.unwrap_or(UNLISTED_ORDER),
        file: format!("{prefix}/{file}"),
        status,
        concept: None,
    }))
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && !is_hidden(p) && p.extension().is_some_and(|e| e == "md"))
        .collect();
    files.sort();
    files
}
