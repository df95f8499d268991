//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};
use std::time::Instant;

use crate::catalog::SourceKind;

/// Metrics prefix for all StudyShelf metrics
pub const METRICS_PREFIX: &str = "studyshelf";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 10ms (cache hit), P99 < 250ms (refresh)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms - P50 target
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms - P99 target
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Catalog metrics
    describe_counter!(
        format!("{}_catalog_refreshes_total", METRICS_PREFIX),
        Unit::Count,
        "Total catalog aggregations from disk"
    );

    describe_histogram!(
        format!("{}_catalog_refresh_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Catalog aggregation latency in seconds"
    );

    describe_gauge!(
        format!("{}_catalog_records", METRICS_PREFIX),
        Unit::Count,
        "Records in the last aggregated catalog"
    );

    describe_counter!(
        format!("{}_catalog_skipped_items_total", METRICS_PREFIX),
        Unit::Count,
        "Source items skipped as malformed, incomplete or unreadable"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one catalog aggregation
pub fn record_refresh(duration_secs: f64, records: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_catalog_refreshes_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    histogram!(format!("{}_catalog_refresh_duration_seconds", METRICS_PREFIX))
        .record(duration_secs);

    if success {
        gauge!(format!("{}_catalog_records", METRICS_PREFIX)).set(records as f64);
    }
}

/// Helper to record skipped source items
pub fn record_skipped(source: SourceKind, count: usize) {
    counter!(
        format!("{}_catalog_skipped_items_total", METRICS_PREFIX),
        "source" => source.as_str()
    )
    .increment(count as u64);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        assert!(LATENCY_BUCKETS.contains(&0.010));
        assert!(LATENCY_BUCKETS.contains(&0.250));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: every helper is a no-op
        let metrics = RequestMetrics::start("GET", "/api/books");
        metrics.finish(200);
        record_refresh(0.01, 12, true);
        record_skipped(SourceKind::Cms, 2);
        record_cache(false, "catalog");
    }
}
