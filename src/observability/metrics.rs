//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by method, status
//! - `gate_request_duration_seconds` (histogram): latency distribution
//! - `gate_rate_limited_total` (counter): rejections by policy
//! - `gate_validation_rejected_total` (counter): validation gate rejections
//! - `gate_security_pattern_total` (counter): pattern matches by category
//!
//! # Design Decisions
//! - The `metrics` facade keeps call sites cheap; the Prometheus exporter
//!   runs on its own listener, off the request path
//! - These are operator-facing aggregates; the telemetry hub's ring buffer
//!   is the source for health classification, not these counters

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    metrics::counter!(
        "gate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gate_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// Record a rate-limit rejection for the named policy.
pub fn record_rate_limited(policy: &str) {
    metrics::counter!("gate_rate_limited_total", "policy" => policy.to_string()).increment(1);
}

/// Record a validation gate rejection.
pub fn record_validation_rejected() {
    metrics::counter!("gate_validation_rejected_total").increment(1);
}

/// Record a pattern-matcher hit for the named category.
pub fn record_security_pattern(category: &str) {
    metrics::counter!("gate_security_pattern_total", "category" => category.to_string())
        .increment(1);
}
