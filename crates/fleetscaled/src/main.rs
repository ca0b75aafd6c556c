//! fleetscaled — the fleetscale daemon.
//!
//! Reads the latest metrics of one Galaxy application, sends the
//! configured notes and alerts, and adjusts the container count according
//! to the autoscale rules.
//!
//! # Usage
//!
//! ```text
//! fleetscaled init --hostname shop.example.com > fleetscale.toml
//! fleetscaled sync --config fleetscale.toml --simulation
//! fleetscaled run --config fleetscale.toml --interval 60
//! ```

mod remote;
mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use fleetscale_core::AutoscalerConfig;
use fleetscale_galaxy::GalaxyClient;
use fleetscale_notify::AnyNotifier;

use crate::remote::ConfigSource;
use crate::sync::{PassOutcome, Syncer};

#[derive(Parser)]
#[command(name = "fleetscaled", about = "Metric alerts and autoscaling for Galaxy apps")]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single sync pass.
    Sync {
        /// Path to the config file (.toml or .json).
        #[arg(long, short)]
        config: PathBuf,

        /// Log decisions without changing the fleet.
        #[arg(long)]
        simulation: bool,
    },
    /// Run sync passes until interrupted.
    Run {
        #[arg(long, short)]
        config: PathBuf,

        /// Seconds between passes.
        #[arg(long, default_value = "60")]
        interval: u64,

        #[arg(long)]
        simulation: bool,
    },
    /// Print a starter config for an application.
    Init {
        #[arg(long)]
        hostname: String,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Sync { config, simulation } => {
            let syncer = build_syncer(&config, simulation).await?;
            match syncer.run_pass().await? {
                PassOutcome::InsufficientMetrics { have, need } => {
                    info!(have, need, "pass skipped, not enough metrics");
                }
                PassOutcome::Completed { alerts, report } => {
                    info!(alerts, actions = report.actions.len(), acted = report.did_act(), "pass complete");
                }
            }
            Ok(())
        }
        Command::Run {
            config,
            interval,
            simulation,
        } => {
            let syncer = build_syncer(&config, simulation).await?;
            run_until_ctrl_c(syncer, Duration::from_secs(interval.max(1))).await;
            Ok(())
        }
        Command::Init { hostname, output } => init(&hostname, output.as_deref()),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,fleetscale=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_syncer(path: &Path, simulation: bool) -> anyhow::Result<Syncer> {
    let source = ConfigSource::new(path, simulation);
    let config = source.resolve().await?;
    info!(
        hostname = %config.variables.hostname,
        rule_sets = config.autoscale_rules.len(),
        simulation = config.simulation,
        "configuration loaded"
    );

    let api = GalaxyClient::new(config.galaxy_url.clone(), &config.api_key)
        .context("failed to create galaxy client")?;
    let notifier = AnyNotifier::from_config(&config).context("failed to create notifier")?;
    Ok(Syncer::new(config, Arc::new(api), Arc::new(notifier)).with_source(source))
}

async fn run_until_ctrl_c(syncer: Syncer, interval: Duration) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Dropping the sender would stop the loop.
                warn!(error = %e, "failed to listen for ctrl-c, running until killed");
                std::future::pending::<()>().await;
            }
        }
    });

    syncer.run(interval, shutdown_rx).await;
    info!("fleetscaled stopped");
}

fn init(hostname: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let content = AutoscalerConfig::scaffold(hostname).to_toml_string()?;
    match output {
        Some(path) => {
            anyhow::ensure!(!path.exists(), "{} already exists", path.display());
            std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}
