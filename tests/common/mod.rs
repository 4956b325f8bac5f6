// Test helpers are intentionally partially used
#![allow(dead_code)]

use club_rsvp::{create_router_with, AppConfig, MetricsKind};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

// ============================================================================
// Test Setup
// ============================================================================

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub client: Client,
}

impl TestServer {
    // ---
    /// In-memory store, no count cache, no-op metrics.
    pub async fn new() -> Self {
        // ---
        Self::with_config(AppConfig::in_memory()).await
    }

    /// Same as [`TestServer::new`] but with Prometheus metrics installed.
    pub async fn with_prometheus() -> Self {
        // ---
        let mut config = AppConfig::in_memory();
        config.metrics = MetricsKind::Prometheus;
        Self::with_config(config).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        // ---

        // Enable debug logging only when requested
        if std::env::var("TEST_DEBUG").is_ok() {
            std::env::set_var("RUST_LOG", "debug");
            std::env::set_var("NO_COLOR", "1");
        }

        let app = create_router_with(config)
            .await
            .expect("Should be able to create router");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { addr, client }
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        // ---
        format!("http://{}", self.addr)
    }

    /// Create an event through the admin endpoint and return its id.
    pub async fn create_event(&self, name: &str, date: &str) -> String {
        // ---
        let res = self
            .client
            .post(self.url("/events"))
            .json(&event_payload(name, date))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 201, "event creation should succeed");

        let body: Value = res.json().await.expect("Failed to parse response");
        body["data"]["id"]
            .as_str()
            .expect("created event has an id")
            .to_string()
    }
}

/// A valid `NewEvent` body.
pub fn event_payload(name: &str, date: &str) -> Value {
    // ---
    json!({
        "name": name,
        "description": format!("{name} for club members"),
        "location": "Engineering Building, Room 101",
        "date": date,
        "start_time": "18:00:00",
        "end_time": "20:00:00",
        "max_capacity": 40,
        "event_type": "workshop"
    })
}

/// A well-formed 32-hex-character identifier.
pub fn fingerprint(seed: u8) -> String {
    // ---
    format!("{:02x}", seed).repeat(16)
}
