//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, upstream
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_attempt_failures_total` (counter): failed forward attempts per upstream
//! - `proxy_pool_exhausted_total` (counter): requests answered with 503
//! - `proxy_fallback_selections_total` (counter): selections with nothing eligible
//! - `proxy_upstream_healthy` (gauge): 1=healthy, 0=unhealthy
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, upstream: &str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "upstream" => upstream.to_string()
    )
    .increment(1);

    histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "upstream" => upstream.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_attempt_failure(upstream: &str) {
    counter!("proxy_attempt_failures_total", "upstream" => upstream.to_string()).increment(1);
}

pub fn record_pool_exhausted() {
    counter!("proxy_pool_exhausted_total").increment(1);
}

pub fn record_fallback() {
    counter!("proxy_fallback_selections_total").increment(1);
}

pub fn record_upstream_health(upstream: &str, healthy: bool) {
    gauge!("proxy_upstream_healthy", "upstream" => upstream.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
