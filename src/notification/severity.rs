//! Severity classification for fault codes
//!
//! Catalog severities are free-form strings. Comparison is case-insensitive,
//! so every value is normalized to upper case on the way in. The severity
//! decides how an alert is routed:
//! - INFO: informational, goes to the info targets
//! - IGNORE: never routed
//! - anything else (ERROR, WARNING, ...): goes to the error targets

use serde::{Deserialize, Serialize};

/// Severity used when the catalog has no entry for a code
pub const DEFAULT_SEVERITY: &str = "ERROR";

/// Severity of a fault code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Info,
    Error,
    Ignore,
    /// Any other label the catalog uses, stored upper-cased
    Other(String),
}

/// Which target list an alert is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Info,
    Error,
}

impl Severity {
    /// Parse a catalog label (case-insensitive, surrounding whitespace ignored)
    pub fn parse(label: &str) -> Self {
        let upper = label.trim().to_uppercase();
        match upper.as_str() {
            "INFO" => Severity::Info,
            "ERROR" => Severity::Error,
            "IGNORE" => Severity::Ignore,
            _ => Severity::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
            Severity::Ignore => "IGNORE",
            Severity::Other(label) => label,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Severity::Ignore)
    }

    /// Route class for this severity, `None` for IGNORE
    pub fn route_class(&self) -> Option<RouteClass> {
        match self {
            Severity::Ignore => None,
            Severity::Info => Some(RouteClass::Info),
            _ => Some(RouteClass::Error),
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Error
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        Severity::parse(&label)
    }
}

impl From<&str> for Severity {
    fn from(label: &str) -> Self {
        Severity::parse(label)
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}
