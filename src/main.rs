//! Robot Alert CLI
//!
//! Watches robot fault codes in Home Assistant and routes alerts

use anyhow::Result;
use clap::{Parser, Subcommand};
use robot_alert::cli::{self, EvaluateArgs, LookupArgs, WatchArgs};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "robot-alert")]
#[command(about = "Robot Alert - classify robot fault codes and route notifications")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/robot-alert/config.yaml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll fault signals and route alerts until interrupted
    Watch(WatchArgs),
    /// Run a single fault transition through the pipeline
    Evaluate(EvaluateArgs),
    /// Show how a fault code resolves against the catalog
    Lookup(LookupArgs),
    /// Show what each configured watcher would do
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls the level, e.g. RUST_LOG=debug robot-alert watch
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("robot_alert=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let (config, catalog) = cli::load_runtime(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch(args) => {
            let stop = Arc::new(AtomicBool::new(false));
            let mut worker = {
                let stop = stop.clone();
                tokio::task::spawn_blocking(move || cli::handle_watch(&config, catalog, args, &stop))
            };

            tokio::select! {
                result = &mut worker => result??,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping watchers");
                    stop.store(true, Ordering::Relaxed);
                    worker.await??;
                }
            }
        }
        Commands::Evaluate(args) => {
            tokio::task::spawn_blocking(move || cli::handle_evaluate(&config, catalog, args)).await??;
        }
        Commands::Lookup(args) => {
            cli::handle_lookup(&catalog, args)?;
        }
        Commands::CheckConfig => {
            cli::handle_check_config(&config, &catalog)?;
        }
    }

    Ok(())
}
