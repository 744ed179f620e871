//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HealthCheckerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HealthCheckerConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid component_name in config")]
    MissingComponentName,
    #[error("healthcheck_poll_interval must be greater than zero")]
    ZeroPollInterval,
    #[error("healthcheck_timeout must be greater than zero")]
    ZeroTimeout,
    #[error("invalid healthcheck_endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("unknown log_level '{0}'")]
    UnknownLogLevel(String),
    #[error("invalid metrics_address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a parsed config for values the watchdog cannot run with.
pub fn validate_config(config: &HealthCheckerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.component_name.trim().is_empty() {
        errors.push(ValidationError::MissingComponentName);
    }
    if config.healthcheck_poll_interval.is_zero() {
        errors.push(ValidationError::ZeroPollInterval);
    }
    if config.healthcheck_timeout.is_zero() {
        errors.push(ValidationError::ZeroTimeout);
    }
    if let Err(e) = config.healthcheck_endpoint.target() {
        errors.push(ValidationError::InvalidEndpoint(e.to_string()));
    }
    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.log_level.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
