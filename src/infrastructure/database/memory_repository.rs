use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Event, EventFilters, EventPage, EventWithRsvpCount, NewEvent, NewRsvp, Pagination,
    Repository, RepositoryPtr, RsvpRecord, RsvpStatus,
};

/// Creates an empty process-local repository.
///
/// Mirrors the PostgreSQL schema's constraints: RSVPs must reference an
/// existing event and (event, fingerprint) is unique.
pub fn create_memory_repository() -> RepositoryPtr {
    // ---
    Arc::new(MemoryRepository::default())
}

#[derive(Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    rsvps: HashMap<Uuid, RsvpRecord>,
}

impl Tables {
    // ---
    fn count_attending(&self, event_id: Uuid) -> i64 {
        // ---
        self.rsvps
            .values()
            .filter(|r| r.event_id == event_id && r.status == RsvpStatus::Attending)
            .count() as i64
    }

    fn with_count(&self, event: &Event) -> EventWithRsvpCount {
        // ---
        EventWithRsvpCount {
            event: event.clone(),
            rsvp_count: self.count_attending(event.id),
        }
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    // ---
    tables: RwLock<Tables>,
}

#[async_trait::async_trait]
impl Repository for MemoryRepository {
    // ---
    async fn find_rsvp(&self, event_id: Uuid, fingerprint: &str) -> Result<Option<RsvpRecord>> {
        // ---
        let tables = self.tables.read().await;
        Ok(tables
            .rsvps
            .values()
            .find(|r| r.event_id == event_id && r.browser_fingerprint == fingerprint)
            .cloned())
    }

    async fn insert_rsvp(&self, rsvp: NewRsvp) -> Result<RsvpRecord> {
        // ---
        let mut tables = self.tables.write().await;

        if !tables.events.contains_key(&rsvp.event_id) {
            bail!(
                "Failed to create RSVP: event {} does not exist",
                rsvp.event_id
            );
        }

        let duplicate = tables.rsvps.values().any(|r| {
            r.event_id == rsvp.event_id && r.browser_fingerprint == rsvp.browser_fingerprint
        });
        if duplicate {
            bail!("Failed to create RSVP: duplicate (event, fingerprint) pair");
        }

        let record = rsvp.into_record();
        tables.rsvps.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update_rsvp_status(
        &self,
        rsvp_id: Uuid,
        status: RsvpStatus,
        rsvp_date: DateTime<Utc>,
    ) -> Result<()> {
        // ---
        let mut tables = self.tables.write().await;

        match tables.rsvps.get_mut(&rsvp_id) {
            Some(record) => {
                record.status = status;
                record.rsvp_date = rsvp_date;
                Ok(())
            }
            None => bail!("Failed to update RSVP: {rsvp_id} no longer exists"),
        }
    }

    async fn count_attending(&self, event_id: Uuid) -> Result<i64> {
        // ---
        Ok(self.tables.read().await.count_attending(event_id))
    }

    async fn event_exists(&self, event_id: Uuid) -> Result<bool> {
        // ---
        Ok(self.tables.read().await.events.contains_key(&event_id))
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event> {
        // ---
        let event = event.into_event();
        self.tables
            .write()
            .await
            .events
            .insert(event.id, event.clone());

        Ok(event)
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventWithRsvpCount>> {
        // ---
        let tables = self.tables.read().await;
        Ok(tables.events.get(&event_id).map(|e| tables.with_count(e)))
    }

    async fn list_events(
        &self,
        filters: &EventFilters,
        pagination: Pagination,
    ) -> Result<EventPage> {
        // ---
        let pagination = pagination.normalized();
        let tables = self.tables.read().await;

        let mut matching: Vec<&Event> = tables
            .events
            .values()
            .filter(|e| filters.matches(e))
            .collect();

        matching.sort_by_key(|e| (e.date, e.start_time));
        if !filters.ascending() {
            matching.reverse();
        }

        let total = matching.len() as u64;
        let events = matching
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(pagination.limit as usize)
            .map(|e| tables.with_count(e))
            .collect();

        Ok(EventPage::new(events, total, pagination))
    }

    async fn all_events(&self) -> Result<Vec<EventWithRsvpCount>> {
        // ---
        let tables = self.tables.read().await;
        Ok(tables.events.values().map(|e| tables.with_count(e)).collect())
    }

    async fn delete_event(&self, event_id: Uuid) -> Result<bool> {
        // ---
        let mut tables = self.tables.write().await;

        tables.rsvps.retain(|_, r| r.event_id != event_id);
        Ok(tables.events.remove(&event_id).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
