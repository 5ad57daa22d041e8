//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Loaded from project config (.srcwiki/config.toml) and SRCWIKI_* env vars.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::pipeline::{DEFAULT_PARSE_WORKERS, DEFAULT_PUBLISH_WORKERS};
use crate::wiki::TitleFilter;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Name of the documentation collection; becomes the root page title
    pub collection: String,

    /// Source workspace settings
    pub workspace: WorkspaceConfig,

    /// Structural parsing settings
    pub parsing: ParsingConfig,

    /// Wiki publishing settings
    pub publishing: PublishingConfig,

    /// Persisted-tree settings
    pub storage: StorageConfig,

    /// Log every page title while flattening
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            collection: "Documentation".to_string(),
            workspace: WorkspaceConfig::default(),
            parsing: ParsingConfig::default(),
            publishing: PublishingConfig::default(),
            storage: StorageConfig::default(),
            verbose: false,
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SrcWikiError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.collection.trim().is_empty() {
            return Err(crate::types::SrcWikiError::Config(
                "collection name must not be empty".to_string(),
            ));
        }

        if self.parsing.workers == 0 {
            return Err(crate::types::SrcWikiError::Config(
                "parsing.workers must be greater than 0".to_string(),
            ));
        }

        if self.publishing.workers == 0 {
            return Err(crate::types::SrcWikiError::Config(
                "publishing.workers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Workspace Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root of the source-control checkout to scan
    pub root: PathBuf,

    /// Additional glob patterns to exclude from the scan
    pub exclude: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            exclude: vec![],
        }
    }
}

// =============================================================================
// Parsing Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Access scopes admitted into the tree; declarations outside this list
    /// are skipped
    pub scopes: Vec<String>,

    /// Worker count for the parse stage
    pub workers: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            scopes: vec!["public".to_string(), "internal".to_string()],
            workers: DEFAULT_PARSE_WORKERS,
        }
    }
}

// =============================================================================
// Publishing Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Worker count for the publish stage
    pub workers: usize,

    /// Directory the local publisher writes pages into
    pub wiki_dir: PathBuf,

    /// Title filters; empty admits every page
    pub filters: Vec<TitleFilter>,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_PUBLISH_WORKERS,
            wiki_dir: PathBuf::from(".srcwiki/wiki"),
            filters: vec![],
        }
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the cumulative tree is persisted between runs
    pub tree_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tree_path: PathBuf::from(".srcwiki/tree.xml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_empty_collection_rejected() {
        let mut config = Config::default();
        config.collection = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.parsing.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.publishing.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_filters_deserialize_from_toml() {
        let toml = r#"
            collection = "Docs"

            [[publishing.filters]]
            contains = "Widget"

            [[publishing.filters]]
            equals = "Docs.Core"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.publishing.filters,
            vec![
                TitleFilter::Contains("Widget".to_string()),
                TitleFilter::Equals("Docs.Core".to_string()),
            ]
        );
    }
}
