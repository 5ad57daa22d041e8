//! Init Command
//!
//! Initialize srcwiki in the current directory.

use std::fs;

use crate::config::ConfigLoader;
use crate::types::{Result, SrcWikiError};

pub fn run(force: bool, collection: Option<&str>) -> Result<()> {
    if ConfigLoader::is_project_initialized() && !force {
        return Err(SrcWikiError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    // Default the collection name to the directory name.
    let root = std::env::current_dir()?;
    let fallback = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("Documentation")
        .to_string();
    let collection = collection.unwrap_or(&fallback);

    let config_path = ConfigLoader::project_config_path();
    if force && config_path.exists() {
        fs::remove_file(&config_path)?;
    }

    let project_dir = ConfigLoader::init_project(Some(collection))?;

    println!("✓ Initialized srcwiki in {}/", project_dir.display());
    println!("  Collection: {}", collection);
    println!();
    println!("Next steps:");
    println!("  1. Edit .srcwiki/config.toml (workspace root, scopes)");
    println!("  2. Run 'srcwiki build' to parse the workspace");
    println!("  3. Run 'srcwiki publish' to write wiki pages");

    Ok(())
}
