//! Prometheus metrics implementation.
//!
//! Implements the `Metrics` trait on top of the global `metrics` crate
//! registry. Counters and histograms live in `counters.rs`; the installed
//! recorder and its render handle live in `recorder.rs`.

use crate::domain::Metrics;
use std::time::Instant;

/// Prometheus-based metrics implementation.
///
/// Empty because all state lives in the global registry populated by the
/// `counter!()` and `histogram!()` macros.
pub struct PrometheusMetrics {
    // Empty - uses global metrics registry pattern
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_rsvp_toggled(&self, attending: bool) {
        tracing::debug!("Recording RSVP toggle");
        super::increment_rsvp_toggled(attending);
    }

    fn record_count_cache_hit(&self) {
        super::increment_count_cache_hit();
    }

    fn record_http_request(&self, start: Instant, path: &str, method: &str, status: u16) {
        super::track_http_request(start, path, method, status);
    }
}
