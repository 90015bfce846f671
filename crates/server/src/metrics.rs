//! Prometheus metrics for observability.
//!
//! This module provides HTTP metrics for the indexhub server and folds in
//! the search metrics recorded by the core crate:
//! - HTTP request metrics (latency, counts, in flight)
//! - Per-indexer request outcomes and latency
//! - Aggregated search outcomes and result counts

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "indexhub_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("http duration metric is valid")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("indexhub_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("http total metric is valid")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "indexhub_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("http in-flight metric is valid")
});

static INDEXER_ID_SEGMENT: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(r"/indexers/[^/]+/test$").expect("indexer id pattern is valid")
});

static NUMERIC_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").expect("numeric pattern is valid"));

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
    ];

    // Core metrics (per-indexer requests, searches)
    for metric in collectors
        .into_iter()
        .chain(indexhub_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = INDEXER_ID_SEGMENT.replace(path, "/indexers/{id}/test");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_indexer_id() {
        let path = "/api/v1/indexers/builtin.yts/test";
        assert_eq!(normalize_path(path), "/api/v1/indexers/{id}/test");
    }

    #[test]
    fn test_normalize_path_keeps_reload() {
        let path = "/api/v1/indexers/reload";
        assert_eq!(normalize_path(path), "/api/v1/indexers/reload");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/indexers/12345/test";
        assert_eq!(normalize_path(path), "/api/v1/indexers/{id}/test");

        let path = "/api/v1/things/12/more/7";
        assert_eq!(normalize_path(path), "/api/v1/things/{id}/more/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("indexhub_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs metrics that have been accessed
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        indexhub_core::metrics::record_indexer_request("registry-test", "success", 0.2);
        indexhub_core::metrics::SEARCHES
            .with_label_values(&["ok"])
            .inc();

        let output = encode_metrics();

        assert!(output.contains("indexhub_http_request_duration_seconds"));
        assert!(output.contains("indexhub_http_requests_in_flight"));
        assert!(output.contains("indexhub_indexer_requests_total"));
        assert!(output.contains("indexhub_searches_total"));
    }
}
