//! CLI command handling

pub mod check;
pub mod evaluate;
pub mod lookup;
pub mod watch;

pub use check::*;
pub use evaluate::*;
pub use lookup::*;
pub use watch::*;

use crate::catalog::CodeCatalog;
use crate::config::AppConfig;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load the configuration file and the catalog it points at.
///
/// An explicit `--config` must exist; a missing default file falls back to
/// an empty configuration so `lookup` works without one.
pub fn load_runtime(config_path: Option<&Path>) -> Result<(AppConfig, Arc<CodeCatalog>)> {
    let config = match config_path {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            let default_path = AppConfig::config_path()?;
            if default_path.exists() {
                AppConfig::load_from(&default_path)?
            } else {
                info!(path = %default_path.display(), "No config file; using defaults");
                AppConfig::default()
            }
        }
    };
    let catalog = CodeCatalog::load_or_empty(&config.catalog_candidates());
    Ok((config, Arc::new(catalog)))
}
