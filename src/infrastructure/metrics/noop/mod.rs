mod noop_metrics;

pub use noop_metrics::NoopMetrics;
use std::sync::Arc;

/// Metrics sink selected when `RSVP_METRICS_TYPE` is not `prom`.
///
/// Toggles, cache hits and request timings are dropped and `/metrics`
/// renders an empty body.
pub fn create() -> anyhow::Result<crate::domain::MetricsPtr> {
    Ok(Arc::new(NoopMetrics::new()))
}
