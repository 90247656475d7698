//! Metrics collection and exposition.
//!
//! # Metrics
//! - `troxy_requests_total` (counter): requests by method, status, outcome
//! - `troxy_request_duration_seconds` (histogram): latency distribution
//! - `troxy_unmatched_requests_total` (counter): requests no recording accepted
//! - `troxy_recording_hits_total` (counter): hits per recording
//!
//! # Design Decisions
//! - Process-wide and independent of the per-server statistics registry
//! - Updates are no-ops until a recorder is installed

use std::net::SocketAddr;
use std::time::Instant;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed replay request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!("troxy_requests_total", &labels).increment(1);
    histogram!("troxy_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record a hit on a specific recording.
pub fn record_recording_hit(recording: &str) {
    counter!("troxy_recording_hits_total", "recording" => recording.to_string()).increment(1);
}

/// Record a request that no recording accepted.
pub fn record_unmatched() {
    counter!("troxy_unmatched_requests_total").increment(1);
}
