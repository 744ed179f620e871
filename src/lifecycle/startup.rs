//! Startup orchestration.
//!
//! # Responsibilities
//! - Give the watched component time to start answering
//! - Build the watchdog from validated config
//!
//! # Design Decisions
//! - Fail fast: an unusable target is fatal before polling starts

use tokio::time;

use crate::config::HealthCheckerConfig;
use crate::watchdog::{Watchdog, WatchdogError};

/// Sleep for the configured startup delay.
pub async fn wait_for_component(config: &HealthCheckerConfig) {
    let delay = config.startup_delay();
    tracing::debug!(
        sleep_time_seconds = delay.as_secs_f64(),
        "Sleeping before component responds to health endpoint on startup"
    );
    time::sleep(delay).await;
}

/// Build the watchdog described by `config`.
pub fn build_watchdog(config: &HealthCheckerConfig) -> Result<Watchdog, WatchdogError> {
    let target = config.healthcheck_endpoint.target()?;
    tracing::info!(
        component = %config.component_name,
        target = %target,
        poll_interval = ?config.healthcheck_poll_interval,
        timeout = ?config.healthcheck_timeout,
        "Watching healthcheck endpoint"
    );

    Ok(Watchdog::new(
        target,
        config.component_name.clone(),
        config.healthcheck_poll_interval,
        config.healthcheck_timeout,
    ))
}
