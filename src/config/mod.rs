//! Configuration
//!
//! Layered configuration: built-in defaults, project TOML, environment.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{Config, ParsingConfig, PublishingConfig, StorageConfig, WorkspaceConfig};
