pub mod build;
pub mod init;
pub mod publish;

use std::path::Path;

use crate::config::{Config, ConfigLoader};
use crate::types::Result;

/// Resolve configuration: an explicit file wins, otherwise the project
/// resolution chain (defaults → project config → env).
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
