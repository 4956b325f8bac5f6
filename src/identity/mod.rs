//! Anonymous browser/device identity.
//!
//! Derives a 32-character hex identifier from environment signals and keeps
//! it in client storage under a versioned key, so the same browser profile
//! presents the same identity to the RSVP endpoints across sessions without
//! logging in.
//!
//! The identifier is only as stable as the storage it lives in: a random
//! salt is mixed in every time one is generated, so clearing storage always
//! yields a new identity.

mod service;
mod signals;
mod storage;

pub use service::{
    compute_fingerprint, fallback_identifier, is_valid_identifier, IdentityOutcome,
    IdentityService, StorageKeys, CURRENT_VERSION,
};
pub use signals::{
    EnvironmentSignals, HostSignals, ScreenInfo, SignalProvider, StaticSignals, CANVAS_LABEL,
};
pub use storage::{FileStorage, IdentityStorage, MemoryStorage};
