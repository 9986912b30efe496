//! Metrics collection and exposition.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize metrics exporter and server.
pub fn init_metrics(addr: SocketAddr) {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus recorder");

    tracing::info!("Metrics server listening on http://{}", addr);
}

/// Record an accepted client connection.
pub fn record_connection_accepted() {
    counter!("proxy_connections_total").increment(1);
}

/// Record a cache lookup that found an entry.
pub fn record_cache_hit() {
    counter!("proxy_cache_hits_total").increment(1);
}

/// Record a cache lookup that missed.
pub fn record_cache_miss() {
    counter!("proxy_cache_misses_total").increment(1);
}

/// Record a committed cache insert.
pub fn record_cache_insert() {
    counter!("proxy_cache_inserts_total").increment(1);
}

/// Record one evicted cache entry.
pub fn record_cache_eviction() {
    counter!("proxy_cache_evictions_total").increment(1);
}

/// Update cache occupancy gauges after an insert commits.
pub fn record_cache_usage(bytes: usize, entries: usize) {
    gauge!("proxy_cache_bytes").set(bytes as f64);
    gauge!("proxy_cache_entries").set(entries as f64);
}

/// Record a connection that ended without a forwarded response.
pub fn record_forward_error(kind: &'static str) {
    counter!("proxy_forward_errors_total", "kind" => kind).increment(1);
}
