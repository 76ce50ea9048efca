//! Authored configuration: package configs, concepts and frontmatter.

pub mod concept;
pub mod config;
mod error;
pub mod frontmatter;

pub use concept::{CONCEPT_MANIFEST, CONCEPTS_DIR, ConceptManifest};
pub use config::{
    CONFIG_FILENAME, DocConfig, OutputMode, PackageSettings, Section, SectionKind,
    SidebarCategory, SidebarConfig, SidebarPackage,
};
pub use error::PackageConfigError;
pub use frontmatter::Frontmatter;
