//! Watchdog error types.

use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

/// Why a single probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{} received from healthcheck endpoint (200 expected)", .0.as_u16())]
    Status(StatusCode),

    #[error("healthcheck endpoint did not respond within {0:?}")]
    Timeout(Duration),

    #[error("failed to connect to healthcheck endpoint: {0}")]
    Connect(#[source] std::io::Error),

    #[error("failed to build healthcheck request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("healthcheck request failed: {0}")]
    Http(#[from] hyper::Error),
}

/// Errors surfaced by the watchdog to its caller.
#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("invalid healthcheck url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid healthcheck target: {0}")]
    InvalidTarget(String),

    #[error("healthcheck for {component} failed after {attempts} consecutive attempts: {cause}")]
    HealthcheckFailed {
        component: String,
        attempts: u32,
        #[source]
        cause: ProbeError,
    },
}
