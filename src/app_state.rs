//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers via the `State` extractor. The `AppState` holds the
//! repository, count cache, metrics, and the RSVP service built on them.
//!
//! The state is cheaply cloneable (everything heavy sits behind an `Arc`) so
//! it can be handed to each request handler without copying resources.

use crate::domain::{CountCachePtr, MetricsPtr, RepositoryPtr};
use crate::rsvp::RsvpService;

/// Shared application state passed to all Axum handlers.
///
/// Dependency injection container for the application, built once in
/// `create_router_with()` and never mutated afterwards.
///
/// # Fields
///
/// - `repository`: events and RSVP rows (PostgreSQL or in-memory)
/// - `count_cache`: short-lived attending counts (Redis or no-op)
/// - `metrics`: metrics implementation (Prometheus or no-op)
/// - `rsvp`: RSVP toggle/status/count operations over the three above
#[derive(Clone)]
pub(crate) struct AppState {
    /// Repository abstraction for events and RSVPs.
    repository: RepositoryPtr,

    /// Attending-count cache; may be a no-op.
    count_cache: CountCachePtr,

    /// Metrics implementation for recording application events.
    metrics: MetricsPtr,

    /// RSVP operations sharing the pointers above.
    rsvp: RsvpService,
}

impl AppState {
    // ---

    pub fn new(repository: RepositoryPtr, count_cache: CountCachePtr, metrics: MetricsPtr) -> Self {
        // ---
        let rsvp = RsvpService::new(repository.clone(), count_cache.clone(), metrics.clone());

        AppState {
            repository,
            count_cache,
            metrics,
            rsvp,
        }
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }

    /// Get a reference to the repository implementation.
    pub(crate) fn repository(&self) -> &RepositoryPtr {
        // ---
        &self.repository
    }

    /// Get a reference to the count cache.
    pub(crate) fn count_cache(&self) -> &CountCachePtr {
        // ---
        &self.count_cache
    }

    /// Get a reference to the RSVP service.
    pub(crate) fn rsvp(&self) -> &RsvpService {
        // ---
        &self.rsvp
    }
}
