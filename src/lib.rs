pub mod aggregate;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod manifest;
pub mod package;
pub mod source;
pub mod status;
pub mod watcher;

pub use aggregate::{Aggregator, BuildContext, OutputFormat};
pub use config::Settings;
pub use discovery::{DiscoveryResult, Ecosystem, Workspace, discover};
pub use manifest::Manifest;
pub use source::{ContentRoot, RootKind, SourceLocator};
pub use status::{BuildMode, PublicationStatus, included};
