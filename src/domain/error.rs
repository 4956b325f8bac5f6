use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by RSVP and event operations.
///
/// Only backend failures carry an underlying cause; the other variants are
/// caller mistakes detected before or instead of a write.
#[derive(Error, Debug)]
pub enum RsvpError {
    #[error("Browser identity must not be empty")]
    InvalidIdentity,

    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Backend operation failed: {0:#}")]
    Backend(#[from] anyhow::Error),
}
