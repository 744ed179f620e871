//! Healthchecker: watches a single HTTP health endpoint and exits when it
//! fails too many times in a row.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod watchdog;

pub use config::schema::HealthCheckerConfig;
pub use watchdog::{EndpointTarget, ExternalSignal, Watchdog, WatchdogError};
