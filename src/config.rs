// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::{bail, Result};
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Which repository implementation backs events and RSVPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    // ---
    /// Process-local tables; contents vanish on restart.
    Memory,

    /// PostgreSQL via `DATABASE_URL`.
    Postgres,
}

/// Which metrics implementation is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsKind {
    // ---
    Noop,
    Prometheus,
}

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address for the HTTP server.
    pub bind_addr: String,

    pub store: StoreKind,

    /// Present exactly when `store` is [`StoreKind::Postgres`].
    pub database: Option<DatabaseConfig>,

    /// Present when a Redis URL is configured; enables the count cache.
    pub redis: Option<RedisConfig>,

    pub metrics: MetricsKind,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    pub fn from_env() -> Result<Self> {
        // ---
        let bind_addr =
            std::env::var("RSVP_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let store = match std::env::var("RSVP_STORE_TYPE").as_deref() {
            Err(_) | Ok("memory") => StoreKind::Memory,
            Ok("postgres") => StoreKind::Postgres,
            Ok(other) => bail!("Invalid RSVP_STORE_TYPE: {other} (expected memory or postgres)"),
        };

        let database = match store {
            StoreKind::Postgres => Some(DatabaseConfig::from_env()?),
            StoreKind::Memory => None,
        };

        let metrics = match std::env::var("RSVP_METRICS_TYPE").as_deref() {
            Ok("prom") => MetricsKind::Prometheus,
            _ => MetricsKind::Noop,
        };

        Ok(Self {
            bind_addr,
            store,
            database,
            redis: RedisConfig::from_env_optional(),
            metrics,
        })
    }

    /// In-memory store, no cache, no-op metrics. Nothing external required.
    pub fn in_memory() -> Self {
        // ---
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            store: StoreKind::Memory,
            database: None,
            redis: None,
            metrics: MetricsKind::Noop,
        }
    }
}

// ============================================================
// Database configuration
// ============================================================

mod database {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of retry attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections to be open concurrently. Defaults to 15
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if `DATABASE_URL` is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("RSVP_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs = optional_env_parse!("RSVP_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("RSVP_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("RSVP_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use database::DatabaseConfig;

// ============================================================
// Redis configuration
// ============================================================

mod redis {
    // ---
    use super::*;

    /// Redis configuration for the attending-count cache.
    #[derive(Debug, Clone)]
    pub struct RedisConfig {
        /// Redis connection string.
        pub url: String,

        /// Time-to-live for cached attending counts. Defaults to 30 seconds.
        pub count_ttl: Duration,
    }

    impl RedisConfig {
        /// Builds a [`RedisConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if `RSVP_REDIS_URL` is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let url = required_env!("RSVP_REDIS_URL");
            let ttl_secs = optional_env_parse!("RSVP_COUNT_CACHE_TTL_SEC", u64, 30);

            Ok(Self {
                url,
                count_ttl: Duration::from_secs(ttl_secs),
            })
        }

        /// Like [`RedisConfig::from_env`], but a missing URL means "no cache".
        pub fn from_env_optional() -> Option<Self> {
            // ---
            Self::from_env().ok()
        }
    }
}
pub use redis::RedisConfig;

// ============================================================
// Tests
// ============================================================
