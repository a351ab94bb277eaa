//! `lookup` - show how a fault code resolves against the catalog

use crate::catalog::CodeCatalog;
use crate::classifier::Classifier;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct LookupArgs {
    /// Fault code as reported by the device
    pub code: String,

    /// Catalog file to use instead of the configured one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_lookup(configured: &CodeCatalog, args: LookupArgs) -> Result<()> {
    let explicit = match &args.catalog {
        Some(path) => Some(CodeCatalog::from_path(path)?),
        None => None,
    };
    let catalog = explicit.as_ref().unwrap_or(configured);
    let classifier = Classifier::new(catalog);
    let classification = classifier.resolve(args.code.trim());
    let watch_severity = classifier.severity_of(args.code.trim());

    if args.json {
        let mut value = serde_json::to_value(&classification)?;
        value["watch_severity"] = serde_json::Value::String(watch_severity.to_string());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Code:        {}", classification.code);
        println!("Catalog key: {}", classification.key);
        println!("Description: {}", classification.description);
        println!("Severity:    {}", classification.severity);
        if watch_severity != classification.severity {
            println!("Watch check: {} (zero-stripped severity lookup)", watch_severity);
        }
    }
    Ok(())
}
