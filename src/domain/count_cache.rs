use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Short-lived cache for derived attending counts.
///
/// Entries are advisory: a miss or an error falls through to the repository,
/// and writers invalidate the entry after every RSVP mutation.
///
/// Each event also carries a generation that every invalidation advances.
/// Readers capture it before counting and fill the cache only if it is
/// unchanged, so a count read before a toggle can never be stored after
/// that toggle's invalidation.
#[async_trait::async_trait]
pub trait CountCache: Send + Sync {
    // ---
    /// Cached attending count for an event, if present and fresh.
    async fn get_count(&self, event_id: Uuid) -> Result<Option<i64>>;

    /// Current generation of the event's entry.
    async fn generation(&self, event_id: Uuid) -> Result<u64>;

    /// Store the count if the generation still equals `generation`.
    ///
    /// Returns whether the count was stored.
    async fn set_count_if_current(&self, event_id: Uuid, count: i64, generation: u64)
        -> Result<bool>;

    /// Drop the cached count and advance the generation.
    async fn invalidate(&self, event_id: Uuid) -> Result<()>;

    /// Check that the cache backend is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Type alias for any backend that implements CountCache.
pub type CountCachePtr = Arc<dyn CountCache>;
