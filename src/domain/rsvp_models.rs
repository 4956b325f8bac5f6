use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Attendance state of a single RSVP row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    // ---
    Attending,
    Cancelled,
}

impl RsvpStatus {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            RsvpStatus::Attending => "attending",
            RsvpStatus::Cancelled => "cancelled",
        }
    }

    /// The opposite status; a toggle always moves between the two.
    pub fn toggled(self) -> Self {
        // ---
        match self {
            RsvpStatus::Attending => RsvpStatus::Cancelled,
            RsvpStatus::Cancelled => RsvpStatus::Attending,
        }
    }

    pub fn is_attending(&self) -> bool {
        // ---
        matches!(self, RsvpStatus::Attending)
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // ---
        match s {
            "attending" => Ok(RsvpStatus::Attending),
            "cancelled" => Ok(RsvpStatus::Cancelled),
            other => Err(anyhow!("unknown RSVP status: {other}")),
        }
    }
}

/// One attendance record for an (event, browser identity) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpRecord {
    // ---
    pub id: Uuid,
    pub event_id: Uuid,
    pub browser_fingerprint: String,

    /// Best-effort client address, never validated.
    pub ip_address: Option<String>,

    /// Best-effort client user agent.
    pub user_agent: Option<String>,

    pub status: RsvpStatus,

    /// Refreshed on every toggle.
    pub rsvp_date: DateTime<Utc>,
}

/// Insert payload for a first-time RSVP.
#[derive(Debug, Clone)]
pub struct NewRsvp {
    // ---
    pub event_id: Uuid,
    pub browser_fingerprint: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewRsvp {
    // ---
    /// Materialize the record a repository stores for this payload.
    pub fn into_record(self) -> RsvpRecord {
        // ---
        RsvpRecord {
            id: Uuid::new_v4(),
            event_id: self.event_id,
            browser_fingerprint: self.browser_fingerprint,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            status: RsvpStatus::Attending,
            rsvp_date: Utc::now(),
        }
    }
}
