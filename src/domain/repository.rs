use super::event_models::{Event, EventFilters, EventPage, EventWithRsvpCount, NewEvent, Pagination};
use super::rsvp_models::{NewRsvp, RsvpRecord, RsvpStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Abstraction over the hosted data store holding events and RSVPs.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    // ---
    /// Find the RSVP row for an (event, browser fingerprint) pair.
    async fn find_rsvp(&self, event_id: Uuid, fingerprint: &str) -> Result<Option<RsvpRecord>>;

    /// Insert a first-time RSVP with status `attending`.
    async fn insert_rsvp(&self, rsvp: NewRsvp) -> Result<RsvpRecord>;

    /// Set the status of an existing RSVP and refresh its timestamp.
    async fn update_rsvp_status(
        &self,
        rsvp_id: Uuid,
        status: RsvpStatus,
        rsvp_date: DateTime<Utc>,
    ) -> Result<()>;

    /// Count `attending` rows for an event.
    async fn count_attending(&self, event_id: Uuid) -> Result<i64>;

    /// Whether an event with this id exists.
    async fn event_exists(&self, event_id: Uuid) -> Result<bool>;

    /// Create a new event.
    async fn create_event(&self, event: NewEvent) -> Result<Event>;

    /// Get a single event with its attending count.
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventWithRsvpCount>>;

    /// List one page of events matching the filters.
    async fn list_events(&self, filters: &EventFilters, pagination: Pagination)
        -> Result<EventPage>;

    /// Every event with its attending count, in no particular order.
    async fn all_events(&self) -> Result<Vec<EventWithRsvpCount>>;

    /// Delete an event and all of its RSVPs. Returns false if the event did not exist.
    async fn delete_event(&self, event_id: Uuid) -> Result<bool>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Type alias for any backend that implements Repository.
pub type RepositoryPtr = Arc<dyn Repository>;
