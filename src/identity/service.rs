use super::signals::{EnvironmentSignals, SignalProvider};
use super::storage::IdentityStorage;
use anyhow::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Mutex;

/// Format version of cached identifiers. Bumping it invalidates every cache.
pub const CURRENT_VERSION: &str = "1.0";

const IDENTIFIER_LEN: usize = 32;
const TRUNCATE_LEN: usize = 100;
const MAX_SALT: u32 = 1_000_000;

static IDENTIFIER_SHAPE: Lazy<Regex> = Lazy::new(|| {
    // ---
    Regex::new(r"^[a-f0-9]{32}$").expect("identifier pattern is valid")
});

/// Storage keys owned by the identity component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    // ---
    pub identifier_key: String,
    pub version_key: String,
    pub version: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            identifier_key: "club_browser_fingerprint".to_string(),
            version_key: "club_fingerprint_version".to_string(),
            version: CURRENT_VERSION.to_string(),
        }
    }
}

/// How an identifier was obtained, and therefore how long it will last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    // ---
    /// Read from or written to persistent storage; stable across sessions.
    Persistent(String),

    /// Storage failed; stable for the lifetime of this service only.
    SessionOnly(String),

    /// Fingerprinting unsupported; a timestamp+random identifier held for the
    /// lifetime of this service only.
    Fallback(String),
}

impl IdentityOutcome {
    // ---
    pub fn identifier(&self) -> &str {
        // ---
        match self {
            IdentityOutcome::Persistent(id)
            | IdentityOutcome::SessionOnly(id)
            | IdentityOutcome::Fallback(id) => id,
        }
    }

    pub fn into_identifier(self) -> String {
        // ---
        match self {
            IdentityOutcome::Persistent(id)
            | IdentityOutcome::SessionOnly(id)
            | IdentityOutcome::Fallback(id) => id,
        }
    }

    pub fn is_persistent(&self) -> bool {
        // ---
        matches!(self, IdentityOutcome::Persistent(_))
    }
}

/// Serialized form of the signals. Field order is part of the hash input.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FingerprintBundle<'a> {
    // ---
    screen: String,
    avail_screen: String,
    timezone: &'a str,
    timezone_offset: i32,
    language: &'a str,
    languages: String,
    platform: &'a str,
    user_agent: String,
    hardware_concurrency: u32,
    device_memory: f64,
    canvas: String,
    cookie_enabled: bool,
    do_not_track: &'a str,
    browser_entropy: String,
}

fn truncate(value: &str) -> String {
    value.chars().take(TRUNCATE_LEN).collect()
}

/// Hash a signal bundle with the given salt into a 32-char hex identifier.
///
/// Deterministic for a fixed salt; identifiers generated by
/// [`IdentityService`] draw a fresh random salt each time.
pub fn compute_fingerprint(signals: &EnvironmentSignals, salt: u32) -> Result<String> {
    // ---
    let screen = &signals.screen;
    let bundle = FingerprintBundle {
        screen: format!("{}x{}x{}", screen.width, screen.height, screen.color_depth),
        avail_screen: format!("{}x{}", screen.avail_width, screen.avail_height),
        timezone: &signals.timezone,
        timezone_offset: signals.timezone_offset_minutes,
        language: &signals.language,
        languages: signals.languages.join(","),
        platform: &signals.platform,
        user_agent: truncate(signals.user_agent.as_deref().unwrap_or_default()),
        hardware_concurrency: signals.hardware_concurrency,
        device_memory: signals.device_memory.unwrap_or(0.0),
        canvas: truncate(signals.canvas_token.as_deref().unwrap_or_default()),
        cookie_enabled: signals.cookie_enabled,
        do_not_track: signals.do_not_track.as_deref().unwrap_or("unknown"),
        browser_entropy: salt.to_string(),
    };

    let serialized = serde_json::to_vec(&bundle)?;
    let digest = Sha256::digest(&serialized);
    let mut hash = hex::encode(digest);
    hash.truncate(IDENTIFIER_LEN);

    Ok(hash)
}

/// Whether a value has the shape of a generated identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_SHAPE.is_match(value)
}

/// Non-persistent identifier for environments that cannot fingerprint.
///
/// Shaped `fallback_<unix millis>_<base36 suffix>`; a new value on every call.
pub fn fallback_identifier() -> String {
    // ---
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("fallback_{}_{suffix}", Utc::now().timestamp_millis())
}

/// Produces and caches the browser identity.
///
/// The session slot holds identifiers that could not be persisted, so
/// repeated calls on one service instance stay stable even when storage is
/// unavailable or fingerprinting is unsupported.
pub struct IdentityService<P, S> {
    // ---
    provider: P,
    storage: S,
    keys: StorageKeys,
    session: Mutex<Option<IdentityOutcome>>,
}

impl<P, S> IdentityService<P, S>
where
    P: SignalProvider,
    S: IdentityStorage,
{
    // ---
    pub fn new(provider: P, storage: S) -> Self {
        // ---
        Self::with_keys(provider, storage, StorageKeys::default())
    }

    pub fn with_keys(provider: P, storage: S, keys: StorageKeys) -> Self {
        // ---
        Self {
            provider,
            storage,
            keys,
            session: Mutex::new(None),
        }
    }

    pub fn storage(&self) -> &S {
        // ---
        &self.storage
    }

    pub fn keys(&self) -> &StorageKeys {
        // ---
        &self.keys
    }

    /// Whether the environment exposes what fingerprinting reads: a user
    /// agent and a canvas token. Hashing is always available natively.
    pub fn is_supported(&self) -> bool {
        // ---
        let signals = self.provider.read_signals();
        signals.user_agent.is_some_and(|ua| !ua.is_empty()) && signals.canvas_token.is_some()
    }

    /// Return the cached identifier, generating and persisting one if needed.
    ///
    /// Never fails: storage problems degrade to a session-only identifier and
    /// unsupported environments get a fallback identifier without storage
    /// being touched.
    pub fn get_identifier(&self) -> IdentityOutcome {
        // ---
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(outcome) = session.as_ref() {
            return outcome.clone();
        }

        if !self.is_supported() {
            tracing::warn!("Fingerprinting unsupported; using fallback identifier");
            let outcome = IdentityOutcome::Fallback(fallback_identifier());
            *session = Some(outcome.clone());
            return outcome;
        }

        match self.load_or_create() {
            Ok(identifier) => IdentityOutcome::Persistent(identifier),
            Err(err) => {
                tracing::warn!("Identity storage unavailable, identifier is session-only: {err:#}");
                let identifier = self.generate().unwrap_or_else(|err| {
                    tracing::warn!("Fingerprint hashing failed: {err:#}");
                    fallback_identifier()
                });
                let outcome = IdentityOutcome::SessionOnly(identifier);
                *session = Some(outcome.clone());
                outcome
            }
        }
    }

    /// Remove the cached identifier and version marker. Idempotent; storage
    /// errors are logged and swallowed.
    pub fn clear_identifier(&self) {
        // ---
        for key in [&self.keys.identifier_key, &self.keys.version_key] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!("Could not clear identity key {key}: {err:#}");
            }
        }

        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn load_or_create(&self) -> Result<String> {
        // ---
        let stored = self.storage.get(&self.keys.identifier_key)?;
        let version = self.storage.get(&self.keys.version_key)?;

        if let (Some(identifier), Some(version)) = (stored, version) {
            if version == self.keys.version && is_valid_identifier(&identifier) {
                return Ok(identifier);
            }
            tracing::debug!("Discarding cached identifier with version {version}");
        }

        let identifier = self.generate()?;
        self.storage.set(&self.keys.identifier_key, &identifier)?;
        self.storage.set(&self.keys.version_key, &self.keys.version)?;

        tracing::debug!("Generated new browser identifier");
        Ok(identifier)
    }

    fn generate(&self) -> Result<String> {
        // ---
        let salt = rand::thread_rng().gen_range(0..=MAX_SALT);
        compute_fingerprint(&self.provider.read_signals(), salt)
    }
}
