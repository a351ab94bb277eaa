//! Fault code catalog
//!
//! The catalog is a JSON array of records such as
//! `{"code": "1005", "text": "Blade motor stalled", "severity": "ERROR"}`.
//! It is loaded once at startup and shared read-only by every watcher.
//!
//! Live signals and the catalog disagree about zero padding (`"007"` vs
//! `"7"`), so every lookup tries the code as issued first and then, for
//! all-digit codes, the code with leading zeros stripped.

use crate::notification::severity::Severity;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Catalog file name the AppDaemon deployment ships
pub const CATALOG_FILE_NAME: &str = "mammotion-errors-en.json";

/// Last-resort location searched when no other candidate exists
pub const FALLBACK_CATALOG_PATH: &str = "/appdaemon/config/apps/mammotion-errors-en.json";

/// Description used for codes missing from the catalog
pub const UNKNOWN_DESCRIPTION: &str = "Unknown error";

/// Errors raised while reading a catalog file
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog must be a JSON array of records")]
    NotAnArray,
}

/// Immutable code → description / severity tables
#[derive(Debug, Clone, Default)]
pub struct CodeCatalog {
    descriptions: HashMap<String, String>,
    severities: HashMap<String, Severity>,
}

impl CodeCatalog {
    /// Catalog with no entries; every code resolves to the defaults
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let data: Value = serde_json::from_str(content)?;
        let records = data.as_array().ok_or(CatalogError::NotAnArray)?;

        let mut catalog = Self::default();
        for record in records {
            let Some(code) = record.get("code").and_then(scalar_to_string) else {
                continue;
            };

            if let Some(text) = record.get("text").and_then(scalar_to_string) {
                catalog.descriptions.insert(code.clone(), text);
            }

            let severity = record
                .get("severity")
                .and_then(Value::as_str)
                .map(Severity::parse)
                .unwrap_or_default();
            catalog.severities.insert(code, severity);
        }

        Ok(catalog)
    }

    /// Read and parse a catalog file
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Load from the first existing candidate path.
    ///
    /// Never fails: a missing or corrupt catalog is logged and an empty
    /// catalog is returned, so every code resolves to the defaults.
    pub fn load_or_empty(candidates: &[PathBuf]) -> Self {
        let Some(path) = candidates.iter().find(|p| p.exists()) else {
            warn!(candidates = ?candidates, "No fault code catalog found; all codes resolve to defaults");
            return Self::empty();
        };

        match Self::from_path(path) {
            Ok(catalog) => {
                info!(
                    path = %path.display(),
                    descriptions = catalog.descriptions.len(),
                    severities = catalog.severities.len(),
                    "Loaded fault code catalog"
                );
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load fault code catalog");
                Self::empty()
            }
        }
    }

    /// Severity for a code using the two-step lookup
    pub fn severity_of(&self, code: &str) -> Severity {
        self.severities
            .get(code)
            .or_else(|| strip_leading_zeros(code).and_then(|s| self.severities.get(s)))
            .cloned()
            .unwrap_or_default()
    }

    /// Key under which a code's description is stored.
    ///
    /// Raw code if the description map has it, else the zero-stripped form if
    /// the map has that, else the raw code again.
    pub fn description_key<'a>(&self, code: &'a str) -> &'a str {
        if self.descriptions.contains_key(code) {
            return code;
        }
        match strip_leading_zeros(code) {
            Some(stripped) if self.descriptions.contains_key(stripped) => {
                debug!(code, key = stripped, "Resolved code via zero-stripped key");
                stripped
            }
            _ => code,
        }
    }

    /// Exact-key description lookup
    pub fn description(&self, key: &str) -> Option<&str> {
        self.descriptions.get(key).map(String::as_str)
    }

    /// Exact-key severity lookup
    pub fn severity(&self, key: &str) -> Option<&Severity> {
        self.severities.get(key)
    }

    pub fn len(&self) -> usize {
        self.severities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.severities.is_empty() && self.descriptions.is_empty()
    }
}

/// Strip leading zeros, only for codes made entirely of ASCII digits
fn strip_leading_zeros(code: &str) -> Option<&str> {
    if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) {
        Some(code.trim_start_matches('0'))
    } else {
        None
    }
}

/// Codes are issued as strings but some catalogs store them as numbers
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Catalog search order: explicit path, file next to the config, fallback
pub fn catalog_candidates(explicit: Option<&Path>, config_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        match config_dir {
            Some(dir) if path.is_relative() => candidates.push(dir.join(path)),
            _ => candidates.push(path.to_path_buf()),
        }
    }
    if let Some(dir) = config_dir {
        candidates.push(dir.join(CATALOG_FILE_NAME));
    }
    candidates.push(PathBuf::from(FALLBACK_CATALOG_PATH));
    candidates
}
