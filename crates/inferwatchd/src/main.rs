//! inferwatchd: health and inference monitor for a model-serving HTTP API.
//!
//! Probes the service on a fixed interval, aggregates latency and error
//! metrics, raises cooldown-gated alerts and writes everything to a
//! rotating JSON log and a JSON-lines metrics file.
//!
//! # Usage
//!
//! ```text
//! inferwatchd --config config/monitoring.toml run
//! inferwatchd once
//! inferwatchd validate
//! inferwatchd init --force
//! ```

mod logging;
mod reporter;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use inferwatch_core::MonitorConfig;
use inferwatch_monitor::{Monitor, SystemClock};
use inferwatch_probe::HttpProber;

use crate::reporter::JsonlReporter;

#[derive(Parser)]
#[command(name = "inferwatchd", about = "Inference service monitor", version)]
struct Cli {
    /// Path to the monitoring configuration file.
    #[arg(long, short, global = true, default_value = "config/monitoring.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor continuously until interrupted (default).
    Run,
    /// Run a single cycle and print its snapshot as JSON.
    Once,
    /// Load and validate the configuration, then exit.
    Validate,
    /// Write a configuration file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&cli.config).await,
        Command::Once => once(&cli.config).await,
        Command::Validate => validate(&cli.config),
        Command::Init { force } => init(&cli.config, force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path) -> anyhow::Result<MonitorConfig> {
    MonitorConfig::load(path).with_context(|| format!("invalid configuration {}", path.display()))
}

/// Load config, install logging and assemble the monitor.
fn build(path: &Path) -> anyhow::Result<Monitor<HttpProber, JsonlReporter, SystemClock>> {
    let config = load(path)?;
    logging::init(&config.logging)?;

    let prober = HttpProber::new(&config).context("invalid service address")?;
    let reporter = JsonlReporter::open(&config.logging.metrics_file)?;
    info!(
        config = %path.display(),
        service = %config.service.base_url,
        metrics_file = %reporter.path().display(),
        "monitor initialized"
    );
    Ok(Monitor::new(&config, prober, reporter, SystemClock))
}

async fn run(path: &Path) -> anyhow::Result<()> {
    let mut monitor = build(path)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!(error = %e, "failed to listen for interrupt"),
        }
    });

    monitor.run(shutdown_rx).await;
    Ok(())
}

async fn once(path: &Path) -> anyhow::Result<()> {
    let mut monitor = build(path)?;
    let report = monitor.run_cycle().await;
    println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    logging::init_console();
    let config = load(path)?;
    println!(
        "configuration OK: {} (service {}, every {}s)",
        path.display(),
        config.service.base_url,
        config.monitoring.check_interval_seconds
    );
    Ok(())
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    logging::init_console();
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    MonitorConfig::default().save(path)?;
    println!("wrote default configuration to {}", path.display());
    Ok(())
}
