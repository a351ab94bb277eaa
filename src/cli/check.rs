//! `check-config` - report what each configured watcher would do

use crate::catalog::CodeCatalog;
use crate::config::{AppConfig, WatcherConfig};
use crate::notification::Target;
use anyhow::Result;

pub fn handle_check_config(config: &AppConfig, catalog: &CodeCatalog) -> Result<()> {
    if let Some(source) = &config.source {
        println!("Config:  {}", source.display());
    }
    println!("Catalog: {} codes", catalog.len());
    println!(
        "Host:    {}",
        config.host.url.as_deref().unwrap_or("(not configured)")
    );
    println!();

    let watchers = config.watcher_configs();
    if watchers.is_empty() {
        println!("No watchers configured");
        return Ok(());
    }

    for watcher in &watchers {
        print_watcher(watcher);
    }
    Ok(())
}

fn print_watcher(watcher: &WatcherConfig) {
    println!("[{}] {}", watcher.name, watcher.friendly_name);
    match &watcher.fault_signal {
        Some(signal) => println!("  fault signal:     {}", signal),
        None => println!("  fault signal:     (none - watcher disabled)"),
    }
    if let Some(signal) = &watcher.timestamp_signal {
        println!("  fault timestamp:  {} (alerts older than 1h suppressed)", signal);
    }
    println!("  error targets:    {}", describe_targets(&watcher.error_targets));
    println!("  info targets:     {}", describe_targets(&watcher.info_targets));
}

fn describe_targets(targets: &[Target]) -> String {
    if targets.is_empty() {
        return "(none - alerts are only logged)".to_string();
    }
    targets
        .iter()
        .map(|t| format!("{} [{}]", t.entity_id, t.backend.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
