//! Metrics collection and exposition.
//!
//! # Metrics
//! - `db_requests_total{method}` (counter): DB calls through the pool
//! - `db_errors_total{method}` (counter): failed DB calls
//! - `db_request_duration_seconds{method}` (histogram): DB call latency
//! - `db_pool_backends` (gauge): live connections in the pool
//! - `http_requests_total{method,route,status}` (counter): handled requests
//! - `http_request_duration_seconds{route}` (histogram): request latency

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

/// Histogram buckets for DB call latency, in seconds.
const DB_LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.3, 0.6, 1.0];

/// Install the Prometheus recorder and its scrape endpoint.
///
/// `global_labels` are attached to every series; use them for values constant
/// per deployment. Install failures are logged and recording degrades to a
/// no-op, so the gateway still serves traffic without metrics.
pub fn init_metrics(addr: SocketAddr, global_labels: &[(&str, String)]) {
    let mut builder = PrometheusBuilder::new().with_http_listener(addr);
    for (key, value) in global_labels {
        builder = builder.add_global_label(*key, value.clone());
    }
    builder = match builder.set_buckets_for_metric(
        Matcher::Full("db_request_duration_seconds".to_string()),
        DB_LATENCY_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(error) => {
            tracing::error!(error = %error, "invalid metrics bucket configuration");
            return;
        }
    };

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(error) => tracing::error!(error = %error, "failed to install metrics exporter"),
    }
}

/// One DB call through the instrumented store.
pub fn record_store_call(method: &'static str, elapsed: Duration, failed: bool) {
    metrics::counter!("db_requests_total", "method" => method).increment(1);
    metrics::histogram!("db_request_duration_seconds", "method" => method)
        .record(elapsed.as_secs_f64());
    if failed {
        metrics::counter!("db_errors_total", "method" => method).increment(1);
    }
}

/// One handled HTTP request.
pub fn record_http_request(method: &'static str, route: &'static str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "http_requests_total",
        "method" => method,
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "route" => route)
        .record(elapsed.as_secs_f64());
}

/// Current number of live backends in the pool.
pub fn record_pool_size(count: usize) {
    metrics::gauge!("db_pool_backends").set(count as f64);
}
