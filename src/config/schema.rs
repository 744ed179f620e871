//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from JSON or TOML files.
//! Durations use [`crate::config::duration`] so both `"10s"` and integer
//! nanoseconds are accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::watchdog::{Credentials, EndpointTarget, WatchdogError};

/// Root configuration for the healthchecker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckerConfig {
    /// Name of the watched component, used in logs and metrics.
    pub component_name: String,

    /// Endpoint to probe.
    pub healthcheck_endpoint: EndpointConfig,

    /// Time between the start of consecutive probes.
    #[serde(with = "crate::config::duration")]
    pub healthcheck_poll_interval: Duration,

    /// Upper bound for a single probe.
    #[serde(with = "crate::config::duration")]
    pub healthcheck_timeout: Duration,

    /// How long the component takes before its health endpoint answers.
    #[serde(with = "crate::config::duration")]
    pub start_response_delay_interval: Duration,

    /// Extra wait added on top of `start_response_delay_interval`.
    #[serde(with = "crate::config::duration")]
    pub startup_delay_buffer: Duration,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for HealthCheckerConfig {
    fn default() -> Self {
        Self {
            component_name: String::new(),
            healthcheck_endpoint: EndpointConfig::default(),
            healthcheck_poll_interval: Duration::from_secs(10),
            healthcheck_timeout: Duration::from_secs(5),
            start_response_delay_interval: Duration::from_secs(5),
            startup_delay_buffer: Duration::from_secs(5),
            log_level: "info".to_string(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl HealthCheckerConfig {
    /// Total wait before the first poll.
    pub fn startup_delay(&self) -> Duration {
        self.start_response_delay_interval + self.startup_delay_buffer
    }
}

/// Health check endpoint.
///
/// A `host` of the form `unix/<absolute path>` (`unix/var/run/app.sock`)
/// probes over that Unix socket; any other host, `unixbox.internal` included,
/// is dialed over TCP.
///
/// Basic auth is sent only when `user` is non-empty. A `password` without a
/// `user` is ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub user: String,
    pub password: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            path: "/health".to_string(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl EndpointConfig {
    /// Build the probe target described by this config.
    pub fn target(&self) -> Result<EndpointTarget, WatchdogError> {
        let credentials = (!self.user.is_empty()).then(|| Credentials {
            user: self.user.clone(),
            password: self.password.clone(),
        });
        EndpointTarget::from_parts(&self.host, self.port, &self.path, credentials)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
