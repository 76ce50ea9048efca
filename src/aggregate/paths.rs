//! Checks on paths taken from authored config before they touch the disk.
//!
//! Output directories are cleared recursively before a unit is rebuilt, so
//! every authored name joined onto the output root (or read from a content
//! root) must stay strictly inside it.

use std::ffi::OsStr;
use std::path::{Component, Path};

use super::collection::SECTIONS_DIR;
use super::error::{AggregateError, AggregateResult};
use crate::manifest::MANIFEST_FILE;

/// `value` as a relative path made only of normal components.
pub fn authored_relative<'a>(field: &'static str, value: &'a str) -> AggregateResult<&'a Path> {
    let path = Path::new(value);
    let reason = if value.trim().is_empty() {
        Some("path is empty")
    } else if !path.components().all(|c| matches!(c, Component::Normal(_))) {
        Some("path must be relative and stay inside its directory")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(AggregateError::UnsafePath {
            field,
            value: value.to_string(),
            reason,
        }),
        None => Ok(path),
    }
}

/// A package's output subdirectory: a safe relative path whose first
/// component is not one the output root reserves for itself.
pub fn package_prefix<'a>(field: &'static str, value: &'a str) -> AggregateResult<&'a Path> {
    let path = authored_relative(field, value)?;
    let first = path.components().next().map(|c| c.as_os_str());
    if first.is_some_and(|c| c == OsStr::new(SECTIONS_DIR) || c == OsStr::new(MANIFEST_FILE)) {
        return Err(AggregateError::UnsafePath {
            field,
            value: value.to_string(),
            reason: "name is reserved in the output root",
        });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_relative_paths_pass() {
        assert!(authored_relative("output", "intro.md").is_ok());
        assert!(authored_relative("output", "guides/intro.md").is_ok());
        assert!(package_prefix("output_dir", "core-runtime").is_ok());
    }

    #[test]
    fn test_escaping_paths_rejected() {
        for value in ["", "  ", "..", "../other", "a/../../b", "/etc", "./intro.md"] {
            assert!(
                matches!(
                    authored_relative("output", value),
                    Err(AggregateError::UnsafePath { .. })
                ),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_reserved_prefixes_rejected() {
        assert!(package_prefix("output_dir", "sections").is_err());
        assert!(package_prefix("output_dir", "sections/nested").is_err());
        assert!(package_prefix("output_dir", "manifest.json").is_err());
        assert!(package_prefix("output_dir", "sections-archive").is_ok());
    }
}
