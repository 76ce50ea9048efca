//! Leading `---` metadata blocks on directly-authored markdown.
//!
//! Sections-mode collections have no central visibility list for most of
//! their files, so each file declares its own `status:`. A file without a
//! frontmatter block, or with a block lacking `status:`, is production.

use std::path::Path;

use serde::Deserialize;

use super::error::PackageConfigError;
use crate::status::PublicationStatus;

const DELIMITER: &str = "---";

/// The frontmatter keys the aggregator cares about.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    #[serde(default)]
    pub status: Option<PublicationStatus>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub order: Option<i64>,
}

impl Frontmatter {
    pub fn effective_status(&self) -> PublicationStatus {
        self.status.unwrap_or(PublicationStatus::Production)
    }
}

/// Split the leading block (without delimiters) from `content`.
///
/// Returns `Ok(None)` when the first line is not a delimiter.
pub fn split(content: &str, path: &Path) -> Result<Option<(String, String)>, PackageConfigError> {
    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => {}
        _ => return Ok(None),
    }

    let mut yaml = Vec::new();
    for line in lines.by_ref() {
        if line.trim_end() == DELIMITER {
            let body: Vec<&str> = lines.collect();
            return Ok(Some((yaml.join("\n"), body.join("\n"))));
        }
        yaml.push(line);
    }

    Err(PackageConfigError::UnclosedFrontmatter {
        path: path.to_path_buf(),
    })
}

/// Parse the frontmatter of `content`, defaulting when there is none.
pub fn parse(content: &str, path: &Path) -> Result<Frontmatter, PackageConfigError> {
    let Some((yaml, _)) = split(content, path)? else {
        return Ok(Frontmatter::default());
    };
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::default());
    }
    serde_yaml_ng::from_str(&yaml).map_err(|e| PackageConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
