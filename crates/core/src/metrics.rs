//! Prometheus metrics for the aggregation engine.
//!
//! This module provides metrics for:
//! - Per-backend requests (outcome, latency)
//! - Aggregate searches (outcome, merged result counts)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Backend Metrics
// =============================================================================

/// Backend requests total by outcome.
pub static INDEXER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "indexhub_indexer_requests_total",
            "Total requests issued to search backends",
        ),
        &["indexer", "status"], // status: "success", "error", "cancelled"
    )
    .expect("indexer requests metric is valid")
});

/// Backend request duration in seconds.
pub static INDEXER_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "indexhub_indexer_request_duration_seconds",
            "Duration of search backend requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
        &["indexer"],
    )
    .expect("indexer request duration metric is valid")
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Aggregate searches total by outcome.
pub static SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("indexhub_searches_total", "Total aggregate searches"),
        &["outcome"], // "ok", "partial", "failed", "cancelled"
    )
    .expect("searches metric is valid")
});

/// Merged results per search.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "indexhub_search_results",
            "Number of merged results returned per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .expect("search results metric is valid")
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one backend request.
pub fn record_indexer_request(indexer: &str, status: &str, seconds: f64) {
    INDEXER_REQUESTS.with_label_values(&[indexer, status]).inc();
    INDEXER_REQUEST_DURATION
        .with_label_values(&[indexer])
        .observe(seconds);
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(INDEXER_REQUESTS.clone()),
        Box::new(INDEXER_REQUEST_DURATION.clone()),
        Box::new(SEARCHES.clone()),
        Box::new(SEARCH_RESULTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        record_indexer_request("metrics-test", "success", 0.2);
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "indexhub_indexer_requests_total"));
    }
}
