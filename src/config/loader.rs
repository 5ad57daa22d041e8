//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Project config (.srcwiki/config.toml)
//! 3. Environment variables (SRCWIKI_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, SrcWikiError};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. SRCWIKI_PARSING_WORKERS -> parsing.workers
        figment = figment.merge(Env::prefixed("SRCWIKI_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| SrcWikiError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| SrcWikiError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".srcwiki/config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".srcwiki")
    }

    /// Check if project is initialized
    pub fn is_project_initialized() -> bool {
        Self::project_dir().exists()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the project data directory and default config
    pub fn init_project(collection: Option<&str>) -> Result<PathBuf> {
        let project_dir = Self::project_dir();

        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(project_dir.join("wiki"))?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, Self::default_project_config(collection))?;
            info!("Created project config: {}", config_path.display());
        }

        Ok(project_dir)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default project config content (TOML)
    fn default_project_config(collection: Option<&str>) -> String {
        let collection = collection.unwrap_or("Documentation");
        format!(
            r#"# srcwiki Project Configuration

version = "1.0"
collection = "{}"

[workspace]
root = "."
exclude = []

[parsing]
scopes = ["public", "internal"]
workers = 4

[publishing]
workers = 4
wiki_dir = ".srcwiki/wiki"

[storage]
tree_path = ".srcwiki/tree.xml"
"#,
            collection
        )
    }
}
