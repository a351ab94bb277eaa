//! `evaluate` - run a single fault transition through the pipeline
//!
//! Readings come from Home Assistant when a host is configured; `--state`
//! overrides individual entities, which also allows fully offline runs with
//! `--dry-run`.

use crate::catalog::CodeCatalog;
use crate::config::AppConfig;
use crate::host::{DryRunDispatcher, HomeAssistantClient, HostError, ServiceDispatcher, StateReader};
use crate::notification::SendResult;
use crate::signal::FaultTransition;
use crate::watcher::{Evaluation, Outcome, SignalWatcher};
use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Watcher name (key under `watchers`)
    #[arg(long, short)]
    pub watcher: String,

    /// Previous fault value
    #[arg(long)]
    pub old: Option<String>,

    /// New fault value
    #[arg(long)]
    pub new: String,

    /// Entity state override, ENTITY=VALUE (repeatable)
    #[arg(long = "state", value_parser = parse_state)]
    pub states: Vec<(String, String)>,

    /// Log service calls instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_state(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(entity, value)| (entity.trim().to_string(), value.to_string()))
        .filter(|(entity, _)| !entity.is_empty())
        .ok_or_else(|| format!("expected ENTITY=VALUE, got '{}'", raw))
}

/// Overrides first, then the host (if any)
struct OverlayReader<'a> {
    overrides: HashMap<String, String>,
    base: Option<&'a dyn StateReader>,
}

impl StateReader for OverlayReader<'_> {
    fn get_state(&self, entity_id: &str) -> Result<Option<String>, HostError> {
        if let Some(value) = self.overrides.get(entity_id) {
            return Ok(Some(value.clone()));
        }
        match self.base {
            Some(base) => base.get_state(entity_id),
            None => Ok(None),
        }
    }
}

pub fn handle_evaluate(config: &AppConfig, catalog: Arc<CodeCatalog>, args: EvaluateArgs) -> Result<()> {
    let watcher_config = config
        .watcher(&args.watcher)
        .with_context(|| format!("No watcher named '{}' in configuration", args.watcher))?;

    let client = if config.host.url.is_some() {
        Some(HomeAssistantClient::new(config.home_assistant()?)?)
    } else if args.dry_run {
        None
    } else {
        bail!("host.url is not configured; use --dry-run with --state to evaluate offline");
    };

    let reader = OverlayReader {
        overrides: args.states.into_iter().collect(),
        base: client.as_ref().map(|c| c as &dyn StateReader),
    };
    let dry_run = DryRunDispatcher::new();
    let dispatcher: &dyn ServiceDispatcher = match &client {
        Some(client) if !args.dry_run => client,
        _ => &dry_run,
    };

    let mut watcher = SignalWatcher::new(watcher_config, catalog);
    watcher.arm(&reader);

    let transition = FaultTransition::new(args.old, Some(args.new));
    let outcome = watcher.on_change(&transition, &reader, dispatcher);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn outcome_json(outcome: &Outcome) -> serde_json::Value {
    let deliveries: Vec<_> = outcome
        .deliveries
        .iter()
        .map(|d| {
            let (status, error) = match &d.result {
                SendResult::Sent => ("sent", None),
                SendResult::Skipped(reason) => ("skipped", Some(reason.as_str())),
                SendResult::Failed(e) => ("failed", Some(e.as_str())),
            };
            json!({"target": d.target, "service": d.service, "status": status, "error": error})
        })
        .collect();

    match &outcome.evaluation {
        Evaluation::Alert(alert) => json!({"alert": alert, "deliveries": deliveries}),
        Evaluation::Suppressed(reason) => json!({"suppressed": format!("{:?}", reason)}),
    }
}

fn print_outcome(outcome: &Outcome) {
    match &outcome.evaluation {
        Evaluation::Suppressed(reason) => println!("Suppressed: {:?}", reason),
        Evaluation::Alert(alert) => {
            println!("Alert ({}): {}", alert.severity, alert.description);
            println!("  long:  {}", alert.long_message);
            println!("  short: {}", alert.short_message);
            if outcome.deliveries.is_empty() {
                println!("  no targets for this severity");
            }
            for delivery in &outcome.deliveries {
                println!("  -> {} via {}: {:?}", delivery.target, delivery.service, delivery.result);
            }
        }
    }
}
