//! Metrics collection and exposition.
//!
//! # Metrics
//! - `healthchecker_probes_total` (counter): probes by component, outcome
//! - `healthchecker_consecutive_failures` (gauge): current failure streak

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one probe.
pub fn record_probe(component: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!(
        "healthchecker_probes_total",
        "component" => component.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Publish the current consecutive-failure count.
pub fn record_consecutive_failures(component: &str, failures: u32) {
    ::metrics::gauge!(
        "healthchecker_consecutive_failures",
        "component" => component.to_string()
    )
    .set(failures as f64);
}
