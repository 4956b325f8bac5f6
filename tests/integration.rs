use anyhow::{ensure, Result};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use club_rsvp::{create_router_with, AppConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{event_payload, fingerprint, TestServer};

#[tokio::test]
async fn basic_integration_test() {
    // ---
    // Test that the router can be created successfully
    let _router = create_router_with(AppConfig::in_memory())
        .await
        .expect("Should be able to create router");
}

#[tokio::test]
async fn router_answers_without_a_socket() -> Result<()> {
    // ---
    let router = create_router_with(AppConfig::in_memory()).await?;

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    ensure!(response.status() == StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn health_endpoint_works() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to read response body");
    assert!(!body.is_empty());
}

#[tokio::test]
async fn full_health_check_pings_backends() -> Result<()> {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health?mode=full"))
        .send()
        .await?;
    ensure!(response.status().is_success());

    let body: Value = response.json().await?;
    ensure!(body == json!({ "status": "ok" }), "unexpected body: {body}");

    Ok(())
}

#[tokio::test]
async fn root_endpoint_works() -> Result<()> {
    // ---
    let server = TestServer::new().await;

    let response = server.client.get(server.url("/")).send().await?;
    ensure!(response.status().is_success());

    let body = response.text().await?;
    ensure!(body.contains("Club RSVP API"));
    ensure!(body.contains("/events/{id}/rsvp"));

    Ok(())
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn event_lifecycle() -> Result<()> {
    // ---
    let server = TestServer::new().await;
    let id = server.create_event("Rust Workshop", "2030-03-14").await;

    // Details carry the count
    let res = server.client.get(server.url(&format!("/events/{id}"))).send().await?;
    ensure!(res.status() == 200);
    let body: Value = res.json().await?;
    ensure!(body["data"]["name"] == "Rust Workshop");
    ensure!(body["data"]["status"] == "upcoming");
    ensure!(body["data"]["allow_anonymous_rsvp"] == true);
    ensure!(body["data"]["rsvp_limit_per_ip"] == 1);
    ensure!(body["data"]["rsvp_count"] == 0);

    // Listing
    let res = server.client.get(server.url("/events")).send().await?;
    ensure!(res.status() == 200);
    let body: Value = res.json().await?;
    ensure!(body["data"]["total_count"] == 1, "unexpected page: {body}");
    ensure!(body["data"]["events"][0]["id"] == id.as_str());

    // Delete, then it is gone
    let res = server
        .client
        .delete(server.url(&format!("/events/{id}")))
        .send()
        .await?;
    ensure!(res.status() == 204);

    let res = server.client.get(server.url(&format!("/events/{id}"))).send().await?;
    ensure!(res.status() == 404);

    let res = server
        .client
        .delete(server.url(&format!("/events/{id}")))
        .send()
        .await?;
    ensure!(res.status() == 404);

    Ok(())
}

#[tokio::test]
async fn listing_filters_and_paginates() -> Result<()> {
    // ---
    let server = TestServer::new().await;
    server.create_event("Intro to Rust", "2030-01-10").await;
    server.create_event("Async Deep Dive", "2030-02-10").await;
    server.create_event("Rust Hack Night", "2030-03-10").await;

    let res = server
        .client
        .get(server.url("/events?search=rust&page=1&limit=1"))
        .send()
        .await?;
    ensure!(res.status() == 200);
    let body: Value = res.json().await?;
    ensure!(body["data"]["total_count"] == 2, "unexpected page: {body}");
    ensure!(body["data"]["total_pages"] == 2, "unexpected page: {body}");
    ensure!(body["data"]["events"].as_array().map(Vec::len) == Some(1));
    // Ascending by date for non-past listings
    ensure!(body["data"]["events"][0]["name"] == "Intro to Rust");

    let res = server
        .client
        .get(server.url("/events?status=past"))
        .send()
        .await?;
    let body: Value = res.json().await?;
    ensure!(body["data"]["total_count"] == 0);

    let res = server.client.get(server.url("/events/by-status")).send().await?;
    ensure!(res.status() == 200);
    let body: Value = res.json().await?;
    ensure!(body["data"]["upcoming"].as_array().map(Vec::len) == Some(3));
    ensure!(body["data"]["past"].as_array().map(Vec::len) == Some(0));

    Ok(())
}

#[tokio::test]
async fn bad_listing_query_answers_with_json_error() -> Result<()> {
    // ---
    let server = TestServer::new().await;

    let res = server
        .client
        .get(server.url("/events?status=bogus"))
        .send()
        .await?;
    ensure!(res.status() == 400);
    let content_type = res
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    ensure!(content_type.starts_with("application/json"), "{content_type}");

    let body: Value = res.json().await?;
    ensure!(
        body["error"].as_str().is_some_and(|e| e.contains("status")),
        "unexpected body: {body}"
    );

    Ok(())
}

#[tokio::test]
async fn huge_pagination_is_clamped() -> Result<()> {
    // ---
    let server = TestServer::new().await;
    server.create_event("Edge Case Evening", "2030-12-01").await;

    let res = server
        .client
        .get(server.url("/events?page=4294967295&limit=4294967295"))
        .send()
        .await?;
    ensure!(res.status() == 200, "unexpected status: {}", res.status());

    let body: Value = res.json().await?;
    ensure!(body["data"]["limit"] == 100, "unexpected page: {body}");
    ensure!(body["data"]["total_count"] == 1);
    ensure!(body["data"]["events"].as_array().map(Vec::len) == Some(0));

    Ok(())
}

#[tokio::test]
async fn invalid_event_is_rejected() -> Result<()> {
    // ---
    let server = TestServer::new().await;

    let mut payload = event_payload("Backwards Meetup", "2030-05-01");
    payload["end_time"] = json!("17:00:00");

    let res = server
        .client
        .post(server.url("/events"))
        .json(&payload)
        .send()
        .await?;
    ensure!(res.status() == 400);

    let body: Value = res.json().await?;
    ensure!(body["error"].as_str().is_some_and(|e| e.contains("End time")));

    Ok(())
}

// ============================================================================
// RSVP
// ============================================================================

async fn toggle(server: &TestServer, event_id: &str, fp: &str) -> Result<bool> {
    // ---
    let res = server
        .client
        .post(server.url(&format!("/events/{event_id}/rsvp")))
        .header("user-agent", "integration-test")
        .header("x-forwarded-for", "203.0.113.7")
        .json(&json!({ "fingerprint": fp }))
        .send()
        .await?;
    ensure!(res.status() == 200, "toggle failed: {}", res.status());

    let body: Value = res.json().await?;
    body["data"]["attending"]
        .as_bool()
        .ok_or_else(|| anyhow::anyhow!("missing attending flag: {body}"))
}

async fn count(server: &TestServer, event_id: &str) -> Result<i64> {
    // ---
    let body: Value = server
        .client
        .get(server.url(&format!("/events/{event_id}/rsvp/count")))
        .send()
        .await?
        .json()
        .await?;
    body["data"]["count"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("missing count: {body}"))
}

async fn status(server: &TestServer, event_id: &str, fp: &str) -> Result<bool> {
    // ---
    let body: Value = server
        .client
        .get(server.url(&format!("/events/{event_id}/rsvp?fingerprint={fp}")))
        .send()
        .await?
        .json()
        .await?;
    body["data"]["attending"]
        .as_bool()
        .ok_or_else(|| anyhow::anyhow!("missing attending flag: {body}"))
}

#[tokio::test]
async fn two_browsers_toggle_one_event() -> Result<()> {
    // ---
    let server = TestServer::new().await;
    let event = server.create_event("Networking Night", "2030-04-01").await;
    let (b1, b2) = (fingerprint(0xb1), fingerprint(0xb2));

    ensure!(count(&server, &event).await? == 0);
    ensure!(!status(&server, &event, &b1).await?);

    ensure!(toggle(&server, &event, &b1).await?);
    ensure!(count(&server, &event).await? == 1);

    ensure!(toggle(&server, &event, &b2).await?);
    ensure!(count(&server, &event).await? == 2);

    // B1 cancels
    ensure!(!toggle(&server, &event, &b1).await?);
    ensure!(count(&server, &event).await? == 1);
    ensure!(!status(&server, &event, &b1).await?);
    ensure!(status(&server, &event, &b2).await?);

    // and comes back
    ensure!(toggle(&server, &event, &b1).await?);
    ensure!(count(&server, &event).await? == 2);

    // Details agree with the count endpoint
    let body: Value = server
        .client
        .get(server.url(&format!("/events/{event}")))
        .send()
        .await?
        .json()
        .await?;
    ensure!(body["data"]["rsvp_count"] == 2);

    Ok(())
}

#[tokio::test]
async fn rsvp_error_statuses() -> Result<()> {
    // ---
    let server = TestServer::new().await;
    let event = server.create_event("Hackathon Kickoff", "2030-06-01").await;

    // Empty fingerprint
    let res = server
        .client
        .post(server.url(&format!("/events/{event}/rsvp")))
        .json(&json!({ "fingerprint": "  " }))
        .send()
        .await?;
    ensure!(res.status() == 400);
    let body: Value = res.json().await?;
    ensure!(body["error"].is_string());

    // Unknown event
    let missing = uuid::Uuid::new_v4();
    let res = server
        .client
        .post(server.url(&format!("/events/{missing}/rsvp")))
        .json(&json!({ "fingerprint": fingerprint(1) }))
        .send()
        .await?;
    ensure!(res.status() == 404);

    // Status lookup needs a fingerprint
    let res = server
        .client
        .get(server.url(&format!("/events/{event}/rsvp")))
        .send()
        .await?;
    ensure!(res.status() == 400);

    // Malformed event id
    let res = server
        .client
        .get(server.url("/events/not-a-uuid/rsvp/count"))
        .send()
        .await?;
    ensure!(res.status() == 400);
    let body: Value = res.json().await?;
    ensure!(body["error"].is_string(), "unexpected body: {body}");

    // Malformed toggle body
    let res = server
        .client
        .post(server.url(&format!("/events/{event}/rsvp")))
        .json(&json!({ "fp": "missing field" }))
        .send()
        .await?;
    ensure!(res.status().is_client_error());
    let body: Value = res.json().await?;
    ensure!(body["error"].is_string(), "unexpected body: {body}");

    // Unknown events count zero
    ensure!(count(&server, &missing.to_string()).await? == 0);

    Ok(())
}

#[tokio::test]
async fn deleting_an_event_drops_its_rsvps() -> Result<()> {
    // ---
    let server = TestServer::new().await;
    let event = server.create_event("Tech Talk", "2030-07-01").await;

    ensure!(toggle(&server, &event, &fingerprint(7)).await?);
    ensure!(count(&server, &event).await? == 1);

    let res = server
        .client
        .delete(server.url(&format!("/events/{event}")))
        .send()
        .await?;
    ensure!(res.status() == 204);

    ensure!(count(&server, &event).await? == 0);

    Ok(())
}
