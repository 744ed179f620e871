//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! watchdog loop produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (probe counters, failure gauge)
//!
//! Consumers:
//!     → stdout (text or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Component name is attached to every event and metric
//! - Metric calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
