//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_requests_total` (counter): remote operations by operation, kind, outcome
//! - `ledger_request_duration_seconds` (histogram): round-trip latency by operation
//! - `ledger_bootstrap_total` (counter): bootstrap runs by outcome and path
//! - `ledger_connected` (gauge): 1=connected, 0=disconnected
//!
//! # Design Decisions
//! - Outcome labels reuse `SyncError::kind()` so dashboards match log fields
//! - The exporter is optional; without it every call is a no-op

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Count one finished remote operation.
pub fn record_request(operation: &str, kind: &'static str, outcome: &'static str) {
    metrics::counter!(
        "ledger_requests_total",
        "operation" => operation.to_string(),
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_request_duration(operation: &str, elapsed: Duration) {
    metrics::histogram!(
        "ledger_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_bootstrap(outcome: &'static str, via: &'static str) {
    metrics::counter!("ledger_bootstrap_total", "outcome" => outcome, "via" => via).increment(1);
}

pub fn record_connected(connected: bool) {
    metrics::gauge!("ledger_connected").set(if connected { 1.0 } else { 0.0 });
}
