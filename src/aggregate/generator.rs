//! Seam for producing section content at aggregation time.
//!
//! Most sections are written ahead of time by external tooling and only
//! read here. Section kinds whose content is deterministic are produced in
//! place through a [`ContentGenerator`], which deposits the file at the
//! section's path inside the content root.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::discovery::Workspace;
use crate::package::Section;
use crate::source::ContentRoot;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Section '{section}' has no command to capture")]
    MissingCommand { section: String },

    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces a section's source file inside its content root.
pub trait ContentGenerator: Send + Sync {
    /// Deposit the file for `section` and return its path.
    fn generate(
        &self,
        root: &ContentRoot,
        workspace: &Workspace,
        section: &Section,
    ) -> Result<PathBuf, GenerateError>;
}

/// Captures a command's stdout into a fenced markdown block.
///
/// The command runs in the package directory, split on whitespace with no
/// shell involved.
#[derive(Debug, Default, Clone)]
pub struct CommandCapture;

impl ContentGenerator for CommandCapture {
    fn generate(
        &self,
        root: &ContentRoot,
        workspace: &Workspace,
        section: &Section,
    ) -> Result<PathBuf, GenerateError> {
        let command = section
            .command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GenerateError::MissingCommand {
                section: section.name.clone(),
            })?;

        let mut parts = command.split_whitespace();
        let program = parts.next().unwrap_or_default();
        let output = Command::new(program)
            .args(parts)
            .current_dir(&workspace.path)
            .output()
            .map_err(|source| GenerateError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(GenerateError::Failed {
                command: command.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let body = format!(
            "# {}\n\n```text\n$ {command}\n{}\n```\n",
            section.display_title(),
            stdout.trim_end()
        );

        let path = root.join(&section.output);
        write_if_changed(&path, body.as_bytes()).map_err(|source| GenerateError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Write `bytes` to `path` unless it already holds exactly those bytes.
///
/// Returns whether the file was touched. Skipping identical writes keeps
/// in-place generation from feeding filesystem events back to a watcher.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> std::io::Result<bool> {
    if fs::read(path).is_ok_and(|existing| existing == bytes) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(true)
}
