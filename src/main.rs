//! Healthchecker
//!
//! Polls a component's health endpoint and exits non-zero once it fails
//! three times in a row.
//!
//! # Architecture Overview
//!
//! ```text
//!   -c config.json/.toml
//!          │
//!          ▼
//!   ┌─────────────┐    ┌──────────────┐    ┌──────────────────────────────┐
//!   │   config    │───▶│  lifecycle   │───▶│          watchdog            │
//!   │ load+valid. │    │ startup delay│    │ timer ─▶ probe ─▶ counter    │──── GET ───▶ component
//!   └─────────────┘    └──────┬───────┘    │   ▲ cancel token  ▲ signals  │    (TCP or unix socket)
//!                             │            └───┼───────────────┼──────────┘
//!                             │  SIGTERM/INT ──┘    SIGUSR1 ───┘
//!                             ▼
//!                      exit 0 / exit 2
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use healthchecker::config::validation::validate_config;
use healthchecker::config::{load_config, ConfigError, HealthCheckerConfig};
use healthchecker::lifecycle::{signals, startup};
use healthchecker::observability::{logging, metrics};

const FAILURE_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "healthchecker")]
#[command(about = "Watch a component's health endpoint and exit when it stays unhealthy", long_about = None)]
struct Cli {
    /// Configuration file (.json or .toml)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

fn load(cli: &Cli) -> Result<HealthCheckerConfig, ConfigError> {
    match &cli.config {
        Some(path) => load_config(path),
        None => {
            let config = HealthCheckerConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            let source = cli
                .config
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".to_string());
            eprintln!("Could not load config file: {}, err: {}", source, e);
            return ExitCode::from(FAILURE_EXIT_CODE);
        }
    };

    if let Err(e) = logging::init_logging(&config.log_level, &config.observability) {
        eprintln!("Could not initialize logging: {}", e);
        return ExitCode::from(FAILURE_EXIT_CODE);
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let span = tracing::info_span!("healthchecker", component = %config.component_name);

    async move {
        startup::wait_for_component(&config).await;
        tracing::info!("Starting");

        let watchdog = match startup::build_watchdog(&config) {
            Ok(watchdog) => watchdog,
            Err(e) => {
                tracing::error!(error = %e, "Error building healthcheck");
                return ExitCode::from(FAILURE_EXIT_CODE);
            }
        };

        let cancel = CancellationToken::new();
        let mut signals = match signals::install(cancel.clone()) {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return ExitCode::from(FAILURE_EXIT_CODE);
            }
        };

        match watchdog.watch(cancel, &mut signals).await {
            Ok(()) => {
                tracing::info!("Exiting");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Error running healthcheck");
                ExitCode::from(FAILURE_EXIT_CODE)
            }
        }
    }
    .instrument(span)
    .await
}
