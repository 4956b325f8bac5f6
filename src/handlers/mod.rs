// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod events;
mod health;
mod metrics;
mod root;
mod rsvp;
mod shared_types;

// Core handlers
pub use health::health_check;
pub use metrics::{metrics_handler, track_requests};
pub use root::root_handler;

// Event read model and admin handlers
pub use events::{create_event, delete_event, events_by_status, get_event, list_events};

// RSVP handlers
pub use rsvp::{rsvp_count, rsvp_status, toggle_rsvp};

// Wire types shared with the HTTP client
pub use rsvp::{AttendanceResponse, CountResponse, ToggleRequest};
pub use shared_types::{ApiResponse, ErrorResponse};
