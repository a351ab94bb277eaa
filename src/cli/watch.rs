//! `watch` - poll Home Assistant and route alerts until interrupted

use crate::catalog::CodeCatalog;
use crate::config::{AppConfig, WatcherConfig};
use crate::host::{DryRunDispatcher, HomeAssistantClient, ServiceDispatcher};
use crate::monitor::Monitor;
use anyhow::{bail, Result};
use clap::Args;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct WatchArgs {
    /// Only run these watchers (repeatable, default: all)
    #[arg(long = "watcher", short)]
    pub watchers: Vec<String>,

    /// Poll interval in seconds (default: poll_interval_secs from config)
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Log service calls instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

/// Pick the watchers named on the command line, or all of them
pub fn select_watchers(config: &AppConfig, names: &[String]) -> Result<Vec<WatcherConfig>> {
    if names.is_empty() {
        return Ok(config.watcher_configs());
    }
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match config.watcher(name) {
            Some(watcher) => selected.push(watcher),
            None => bail!("No watcher named '{}' in configuration", name),
        }
    }
    Ok(selected)
}

/// Blocking poll loop; returns once `stop` is set
pub fn handle_watch(
    config: &AppConfig,
    catalog: Arc<CodeCatalog>,
    args: WatchArgs,
    stop: &AtomicBool,
) -> Result<()> {
    let watchers = select_watchers(config, &args.watchers)?;
    if watchers.is_empty() {
        bail!("No watchers configured");
    }

    let client = HomeAssistantClient::new(config.home_assistant()?)?;
    let dry_run = DryRunDispatcher::new();
    let dispatcher: &dyn ServiceDispatcher = if args.dry_run { &dry_run } else { &client };

    let interval = Duration::from_secs(args.interval.unwrap_or(config.poll_interval_secs).max(1));
    let mut monitor = Monitor::new(watchers, catalog);
    monitor.arm_all(&client);

    info!(interval_secs = interval.as_secs(), dry_run = args.dry_run, "Watching fault signals");

    while !stop.load(Ordering::Relaxed) {
        monitor.poll_once(&client, dispatcher);
        dry_run.take_calls();
        sleep_until_stopped(interval, stop);
    }

    info!("Watch stopped");
    Ok(())
}

fn sleep_until_stopped(duration: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + duration;
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(STOP_CHECK_INTERVAL.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "watchers:\n  garth:\n    error: sensor.a\n  luba:\n    error: sensor.b\n";

    #[test]
    fn test_select_watchers() {
        let config = AppConfig::from_yaml_str(CONFIG).unwrap();

        assert_eq!(select_watchers(&config, &[]).unwrap().len(), 2);

        let only = select_watchers(&config, &["luba".to_string()]).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name, "luba");

        assert!(select_watchers(&config, &["nope".to_string()]).is_err());
    }

    #[test]
    fn test_sleep_returns_immediately_when_stopped() {
        let stop = AtomicBool::new(true);
        let started = Instant::now();
        sleep_until_stopped(Duration::from_secs(30), &stop);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_watch_requires_host() {
        let config = AppConfig::from_yaml_str(CONFIG).unwrap();
        let args = WatchArgs {
            watchers: vec![],
            interval: None,
            dry_run: true,
        };
        let stop = AtomicBool::new(true);
        assert!(handle_watch(&config, Arc::new(CodeCatalog::empty()), args, &stop).is_err());
    }
}
