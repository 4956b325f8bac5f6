use metrics::{counter, histogram};
use std::time::Instant;

/// Count RSVP toggles by the status they ended in.
pub fn increment_rsvp_toggled(attending: bool) {
    // ---
    let status = if attending { "attending" } else { "cancelled" };
    counter!("rsvp_toggles_total", "status" => status).increment(1);
}

/// Count attending-count lookups served from the cache.
pub fn increment_count_cache_hit() {
    counter!("rsvp_count_cache_hits_total").increment(1);
}

/// Track HTTP request latency using a histogram.
pub fn track_http_request(start: Instant, path: &str, method: &str, status: u16) {
    // ---
    let elapsed = start.elapsed();
    histogram!(
        "http_request_duration_seconds",
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
