use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle phase of an event, maintained by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    // ---
    Upcoming,
    Ongoing,
    Past,
}

impl EventStatus {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Past => "past",
        }
    }
}

impl FromStr for EventStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // ---
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "past" => Ok(EventStatus::Past),
            other => Err(anyhow!("unknown event status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // ---
    Workshop,
    TechTalk,
    Hackathon,
    Networking,
}

impl EventType {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            EventType::Workshop => "workshop",
            EventType::TechTalk => "tech_talk",
            EventType::Hackathon => "hackathon",
            EventType::Networking => "networking",
        }
    }
}

impl FromStr for EventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // ---
        match s {
            "workshop" => Ok(EventType::Workshop),
            "tech_talk" => Ok(EventType::TechTalk),
            "hackathon" => Ok(EventType::Hackathon),
            "networking" => Ok(EventType::Networking),
            other => Err(anyhow!("unknown event type: {other}")),
        }
    }
}

/// A club event as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    // ---
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub max_capacity: i32,
    pub status: EventStatus,
    pub event_type: EventType,
    pub allow_anonymous_rsvp: bool,

    /// Captured with the event but not enforced by the RSVP toggle.
    pub rsvp_limit_per_ip: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event joined with its current attending count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventWithRsvpCount {
    // ---
    #[serde(flatten)]
    pub event: Event,
    pub rsvp_count: i64,
}

/// Admin payload for creating an event. New events always start `upcoming`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    // ---
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    pub max_capacity: i32,
    pub event_type: EventType,
    #[serde(default = "default_allow_anonymous_rsvp")]
    pub allow_anonymous_rsvp: bool,
    #[serde(default = "default_rsvp_limit_per_ip")]
    pub rsvp_limit_per_ip: i32,
}

fn default_allow_anonymous_rsvp() -> bool {
    true
}

fn default_rsvp_limit_per_ip() -> i32 {
    1
}

impl NewEvent {
    // ---
    /// Reject payloads the admin form would not accept.
    pub fn validate(&self) -> Result<()> {
        // ---
        if self.name.trim().is_empty() {
            bail!("Event name is required");
        }
        if self.location.trim().is_empty() {
            bail!("Event location is required");
        }
        if self.max_capacity < 1 {
            bail!("Max capacity must be at least 1");
        }
        if self.rsvp_limit_per_ip < 1 {
            bail!("RSVP limit per IP must be at least 1");
        }
        if let Some(end_time) = self.end_time {
            if end_time <= self.start_time {
                bail!("End time must be after start time");
            }
        }
        Ok(())
    }

    /// Materialize the stored event with a fresh id and timestamps.
    pub fn into_event(self) -> Event {
        // ---
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            location: self.location,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            max_capacity: self.max_capacity,
            status: EventStatus::Upcoming,
            event_type: self.event_type,
            allow_anonymous_rsvp: self.allow_anonymous_rsvp,
            rsvp_limit_per_ip: self.rsvp_limit_per_ip,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status filter for listings; `all` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    // ---
    #[default]
    All,
    Upcoming,
    Ongoing,
    Past,
}

impl StatusFilter {
    // ---
    pub fn status(&self) -> Option<EventStatus> {
        // ---
        match self {
            StatusFilter::All => None,
            StatusFilter::Upcoming => Some(EventStatus::Upcoming),
            StatusFilter::Ongoing => Some(EventStatus::Ongoing),
            StatusFilter::Past => Some(EventStatus::Past),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilters {
    // ---
    #[serde(default)]
    pub status: StatusFilter,
    pub event_type: Option<EventType>,

    /// Case-insensitive substring matched against name and description.
    pub search: Option<String>,
}

impl EventFilters {
    // ---
    /// Non-empty trimmed search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        // ---
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn matches(&self, event: &Event) -> bool {
        // ---
        if let Some(status) = self.status.status() {
            if event.status != status {
                return false;
            }
        }

        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }

        match self.search_term() {
            Some(term) => {
                let needle = term.to_lowercase();
                event.name.to_lowercase().contains(&needle)
                    || event
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Listings run oldest first, except a past-only listing which runs newest first.
    pub fn ascending(&self) -> bool {
        // ---
        self.status != StatusFilter::Past
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    // ---
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

/// Largest page a listing returns.
pub const MAX_PAGE_LIMIT: u32 = 100;

fn default_limit() -> u32 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Pagination {
    // ---
    /// Clamp page to at least one and limit to `1..=MAX_PAGE_LIMIT`.
    pub fn normalized(self) -> Self {
        // ---
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Rows skipped before this page. At most `(u32::MAX - 1) * MAX_PAGE_LIMIT`.
    pub fn offset(&self) -> u64 {
        // ---
        let p = self.normalized();
        u64::from(p.page - 1) * u64::from(p.limit)
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        // ---
        total_count.div_ceil(u64::from(self.normalized().limit))
    }
}

/// One page of an event listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPage {
    // ---
    pub events: Vec<EventWithRsvpCount>,
    pub total_count: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl EventPage {
    // ---
    pub fn new(events: Vec<EventWithRsvpCount>, total_count: u64, pagination: Pagination) -> Self {
        // ---
        let pagination = pagination.normalized();
        Self {
            events,
            total_count,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages(total_count),
        }
    }
}

/// All events split by lifecycle phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupedEvents {
    // ---
    pub upcoming: Vec<EventWithRsvpCount>,
    pub ongoing: Vec<EventWithRsvpCount>,
    pub past: Vec<EventWithRsvpCount>,
}

fn by_schedule(a: &EventWithRsvpCount, b: &EventWithRsvpCount) -> Ordering {
    // ---
    (a.event.date, a.event.start_time).cmp(&(b.event.date, b.event.start_time))
}

/// Group events by status. Upcoming and ongoing events run soonest first,
/// past events most recent first.
pub fn group_by_status(events: Vec<EventWithRsvpCount>) -> GroupedEvents {
    // ---
    let mut grouped = GroupedEvents::default();

    for event in events {
        match event.event.status {
            EventStatus::Upcoming => grouped.upcoming.push(event),
            EventStatus::Ongoing => grouped.ongoing.push(event),
            EventStatus::Past => grouped.past.push(event),
        }
    }

    grouped.upcoming.sort_by(by_schedule);
    grouped.ongoing.sort_by(by_schedule);
    grouped.past.sort_by(|a, b| by_schedule(b, a));

    grouped
}
