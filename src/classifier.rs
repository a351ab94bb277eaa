//! Resolve fault codes to a description and severity

use crate::catalog::{CodeCatalog, UNKNOWN_DESCRIPTION};
use crate::notification::severity::Severity;
use serde::Serialize;

/// Catalog resolution of one code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Code as reported
    pub code: String,
    /// Key the catalog was consulted with
    pub key: String,
    pub description: String,
    pub severity: Severity,
}

/// Classifier over a shared catalog
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    catalog: &'a CodeCatalog,
}

impl<'a> Classifier<'a> {
    pub fn new(catalog: &'a CodeCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve description and severity.
    ///
    /// The lookup key is chosen by the description map (raw code, then the
    /// zero-stripped code, then the raw code again) and both values are read
    /// with that key.
    pub fn resolve(&self, code: &str) -> Classification {
        let key = self.catalog.description_key(code);
        let description = self
            .catalog
            .description(key)
            .unwrap_or(UNKNOWN_DESCRIPTION)
            .to_string();
        let severity = self.catalog.severity(key).cloned().unwrap_or_default();

        Classification {
            code: code.to_string(),
            key: key.to_string(),
            description,
            severity,
        }
    }

    /// Severity only, using the catalog's two-step severity lookup
    pub fn severity_of(&self, code: &str) -> Severity {
        self.catalog.severity_of(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CodeCatalog {
        CodeCatalog::from_json_str(
            r#"[
                {"code": "7", "text": "Blade motor stalled", "severity": "error"},
                {"code": "12", "text": "Mowing finished", "severity": "info"},
                {"code": "8", "severity": "INFO"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_exact_code() {
        let catalog = catalog();
        let resolved = Classifier::new(&catalog).resolve("12");
        assert_eq!(resolved.description, "Mowing finished");
        assert_eq!(resolved.severity, Severity::Info);
        assert_eq!(resolved.key, "12");
    }

    #[test]
    fn test_resolve_zero_padded_code() {
        let catalog = catalog();
        let resolved = Classifier::new(&catalog).resolve("007");
        assert_eq!(resolved.code, "007");
        assert_eq!(resolved.key, "7");
        assert_eq!(resolved.description, "Blade motor stalled");
        assert_eq!(resolved.severity, Severity::Error);
    }

    #[test]
    fn test_resolve_unknown_code() {
        let catalog = catalog();
        let resolved = Classifier::new(&catalog).resolve("0404");
        assert_eq!(resolved.description, "Unknown error");
        assert_eq!(resolved.severity, Severity::Error);
        assert_eq!(resolved.key, "0404");
    }

    #[test]
    fn test_key_follows_description_map() {
        // "8" has a severity but no text, so "008" keeps its raw key and
        // both values fall back to the defaults
        let catalog = catalog();
        let classifier = Classifier::new(&catalog);
        let resolved = classifier.resolve("008");
        assert_eq!(resolved.key, "008");
        assert_eq!(resolved.description, "Unknown error");
        assert_eq!(resolved.severity, Severity::Error);

        // the watcher's severity check still sees INFO
        assert_eq!(classifier.severity_of("008"), Severity::Info);
    }

    #[test]
    fn test_empty_catalog_defaults() {
        let catalog = CodeCatalog::empty();
        let resolved = Classifier::new(&catalog).resolve("7");
        assert_eq!(
            (resolved.description.as_str(), resolved.severity),
            ("Unknown error", Severity::Error)
        );
    }
}
