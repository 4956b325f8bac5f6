// src/lib.rs
use anyhow::Result;
use app_state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use handlers::{
    create_event, delete_event, events_by_status, get_event, health_check, list_events,
    metrics_handler, root_handler, rsvp_count, rsvp_status, toggle_rsvp, track_requests,
};

// Public exports (visible outside this module)
pub mod client;
pub mod domain;
pub mod identity;
pub mod rsvp;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;

pub use config::*;

// Wire types, shared by the server and `client::RsvpClient`
pub use handlers::{ApiResponse, AttendanceResponse, CountResponse, ErrorResponse, ToggleRequest};

pub use rsvp::RsvpService;

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    create_memory_repository, // ---
    create_noop_count_cache,
    create_noop_metrics,
    create_postgres_repository,
    create_prom_metrics,
    create_redis_count_cache,
    init_database_with_retry,
};

/// Build the HTTP router with backends determined by environment variables.
pub async fn create_router() -> Result<Router> {
    // ---
    // Load all configuration from environment
    let config = AppConfig::from_env()?;
    create_router_with(config).await
}

/// Build the HTTP router from an explicit configuration.
pub async fn create_router_with(config: AppConfig) -> Result<Router> {
    // ---
    tracing_subscriber::fmt::try_init().ok(); // Ignores if already initialized

    let metrics = match config.metrics {
        MetricsKind::Prometheus => create_prom_metrics()?,
        MetricsKind::Noop => create_noop_metrics()?,
    };

    // Create infrastructure dependencies
    let repository = match (&config.store, &config.database) {
        (StoreKind::Postgres, Some(db)) => {
            let pool = init_database_with_retry(db).await?;
            create_postgres_repository(pool)
        }
        (StoreKind::Postgres, None) => anyhow::bail!("Postgres store selected without database config"),
        (StoreKind::Memory, _) => create_memory_repository(),
    };

    let count_cache = match &config.redis {
        Some(redis) => create_redis_count_cache(redis)?,
        None => create_noop_count_cache(),
    };

    tracing::info!(
        store = ?config.store,
        metrics = ?config.metrics,
        count_cache = config.redis.is_some(),
        "Backends initialized"
    );

    // Build application state with all dependencies
    let app_state = AppState::new(repository, count_cache, metrics);

    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/events", get(list_events).post(create_event))
        .route("/events/by-status", get(events_by_status))
        .route("/events/{id}", get(get_event).delete(delete_event))
        .route("/events/{id}/rsvp", post(toggle_rsvp).get(rsvp_status))
        .route("/events/{id}/rsvp/count", get(rsvp_count))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_requests,
        ))
        .with_state(app_state);

    Ok(router)
}
