//! RSVP toggling and attendance lookups.
//!
//! Keeps at most one RSVP row per (event, browser identity): the first toggle
//! inserts an `attending` row, later toggles flip that row in place. The
//! lookup-then-write sequence is not atomic; two concurrent toggles for the
//! same pair can race, and the store's unique index turns the losing insert
//! into a backend error.

use crate::domain::{
    CountCachePtr, MetricsPtr, NewRsvp, RepositoryPtr, RsvpError, RsvpStatus,
};
use chrono::Utc;
use uuid::Uuid;

/// RSVP operations over the shared repository, count cache and metrics.
#[derive(Clone)]
pub struct RsvpService {
    // ---
    repository: RepositoryPtr,
    cache: CountCachePtr,
    metrics: MetricsPtr,
}

impl RsvpService {
    // ---
    pub fn new(repository: RepositoryPtr, cache: CountCachePtr, metrics: MetricsPtr) -> Self {
        // ---
        Self {
            repository,
            cache,
            metrics,
        }
    }

    /// Flip the RSVP for (event, identity), creating it as `attending` if absent.
    ///
    /// Returns `true` when the resulting status is `attending`.
    #[tracing::instrument(skip(self, identity, ip_address, user_agent))]
    pub async fn toggle_rsvp(
        &self,
        event_id: Uuid,
        identity: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<bool, RsvpError> {
        // ---
        let identity = validate_identity(identity)?;

        let attending = match self.repository.find_rsvp(event_id, identity).await? {
            Some(existing) => {
                let status = existing.status.toggled();
                self.repository
                    .update_rsvp_status(existing.id, status, Utc::now())
                    .await?;
                status.is_attending()
            }
            None => {
                if !self.repository.event_exists(event_id).await? {
                    return Err(RsvpError::EventNotFound(event_id));
                }
                self.repository
                    .insert_rsvp(NewRsvp {
                        event_id,
                        browser_fingerprint: identity.to_string(),
                        ip_address,
                        user_agent,
                    })
                    .await?;
                true
            }
        };

        self.invalidate_count(event_id).await;
        self.metrics.record_rsvp_toggled(attending);
        tracing::info!(attending, "RSVP toggled");

        Ok(attending)
    }

    /// Whether the identity currently holds an `attending` RSVP for the event.
    pub async fn get_attending_status(
        &self,
        event_id: Uuid,
        identity: &str,
    ) -> Result<bool, RsvpError> {
        // ---
        let identity = validate_identity(identity)?;
        let rsvp = self.repository.find_rsvp(event_id, identity).await?;

        Ok(rsvp.is_some_and(|r| r.status == RsvpStatus::Attending))
    }

    /// Number of `attending` RSVPs for the event, served from the count cache
    /// when it holds a fresh entry.
    ///
    /// On a miss the count is read from the repository and cached only if no
    /// toggle invalidated the entry while the read was in flight.
    pub async fn get_attending_count(&self, event_id: Uuid) -> Result<i64, RsvpError> {
        // ---
        match self.cache.get_count(event_id).await {
            Ok(Some(count)) => {
                self.metrics.record_count_cache_hit();
                return Ok(count);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Count cache read failed for {event_id}: {err:#}"),
        }

        // Captured before the repository read
        let generation = match self.cache.generation(event_id).await {
            Ok(generation) => Some(generation),
            Err(err) => {
                tracing::warn!("Count cache generation read failed for {event_id}: {err:#}");
                None
            }
        };

        let count = self.repository.count_attending(event_id).await?;

        if let Some(generation) = generation {
            match self
                .cache
                .set_count_if_current(event_id, count, generation)
                .await
            {
                Ok(true) => {}
                Ok(false) => tracing::debug!("Count for {event_id} changed during read; not cached"),
                Err(err) => tracing::warn!("Count cache write failed for {event_id}: {err:#}"),
            }
        }

        Ok(count)
    }

    /// Drop any cached count for the event. Failures only cost freshness.
    pub async fn invalidate_count(&self, event_id: Uuid) {
        // ---
        if let Err(err) = self.cache.invalidate(event_id).await {
            tracing::warn!("Count cache invalidation failed for {event_id}: {err:#}");
        }
    }
}

fn validate_identity(identity: &str) -> Result<&str, RsvpError> {
    // ---
    let identity = identity.trim();
    if identity.is_empty() {
        return Err(RsvpError::InvalidIdentity);
    }
    Ok(identity)
}
