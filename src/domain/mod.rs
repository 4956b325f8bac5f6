mod count_cache;
mod error;
mod event_models;
mod metrics;
mod repository;
mod rsvp_models;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose persistence abstractions
pub use count_cache::{CountCache, CountCachePtr};
pub use repository::{Repository, RepositoryPtr};

// Record types and the typed RSVP error
pub use error::RsvpError;
pub use event_models::{
    group_by_status, Event, EventFilters, EventPage, EventStatus, EventType, EventWithRsvpCount,
    GroupedEvents, NewEvent, Pagination, StatusFilter, MAX_PAGE_LIMIT,
};
pub use rsvp_models::{NewRsvp, RsvpRecord, RsvpStatus};
