//! Content transforms applied between the content root and the output.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::source::ASSET_DIRS;

/// Shape of the output tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Files copied verbatim.
    #[default]
    Markdown,
    /// Relative asset links rewritten to absolute site paths.
    Website,
}

static ASSET_LINK: LazyLock<Regex> = LazyLock::new(|| {
    let folders = ASSET_DIRS.join("|");
    // Markdown `](images/...)` / `](./images/...)` and HTML `src="images/..."`.
    Regex::new(&format!(r#"(\]\(|src=")(?:\./)?({folders})/"#)).expect("asset link regex")
});

/// Drop the first `count` lines of `content`.
pub fn strip_leading_lines(content: &str, count: usize) -> String {
    if count == 0 {
        return content.to_string();
    }
    let mut rest = content;
    for _ in 0..count {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return String::new(),
        }
    }
    rest.to_string()
}

/// Rewrite relative asset links to `<base_url>/<prefix>/<folder>/`.
pub fn rewrite_asset_links(content: &str, base_url: &str, prefix: &str) -> String {
    let base = base_url.trim_end_matches('/');
    ASSET_LINK
        .replace_all(content, |caps: &regex::Captures<'_>| {
            format!("{}{base}/{prefix}/{}/", &caps[1], &caps[2])
        })
        .into_owned()
}

/// Apply the per-format transform.
pub fn apply(format: OutputFormat, content: &str, base_url: &str, prefix: &str) -> String {
    match format {
        OutputFormat::Markdown => content.to_string(),
        OutputFormat::Website => rewrite_asset_links(content, base_url, prefix),
    }
}
