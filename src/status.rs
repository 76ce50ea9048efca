//! Publication lifecycle and the visibility predicate.
//!
//! Every publishable unit (section, sidebar package, concept, collection
//! file) carries a [`PublicationStatus`]. Whether it reaches the output tree
//! depends only on that status and the current [`BuildMode`]:
//!
//! | status     | dev   | prod  |
//! |------------|-------|-------|
//! | draft      | no    | no    |
//! | dev        | yes   | no    |
//! | production | yes   | yes   |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Visibility tag attached to authored content.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PublicationStatus {
    /// Never leaves the authoring area.
    #[default]
    Draft,
    /// Visible in dev builds only.
    Dev,
    /// Visible everywhere.
    Production,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Dev => "dev",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "dev" | "development" => Ok(Self::Dev),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown publication status '{other}'")),
        }
    }
}

// Serialized files and hand-written YAML accept the same spellings.
impl TryFrom<String> for PublicationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which audience a build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum BuildMode {
    Dev,
    Prod,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => f.write_str("dev"),
            Self::Prod => f.write_str("prod"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(format!("unknown build mode '{other}' (expected dev or prod)")),
        }
    }
}

impl TryFrom<String> for BuildMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Whether content tagged `status` is visible in a `mode` build.
pub fn included(status: PublicationStatus, mode: BuildMode) -> bool {
    match status {
        PublicationStatus::Draft => false,
        PublicationStatus::Dev => mode == BuildMode::Dev,
        PublicationStatus::Production => true,
    }
}
