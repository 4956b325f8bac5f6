use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Welcome to the Club RSVP API 👋
Version: {version}

Available endpoints:
  - GET    /events                        - List events (status, event_type, search, page, limit)
  - GET    /events/by-status              - Events grouped by upcoming/ongoing/past
  - POST   /events                        - Create an event
  - GET    /events/{{id}}                   - Event details with RSVP count
  - DELETE /events/{{id}}                   - Delete an event and its RSVPs
  - POST   /events/{{id}}/rsvp              - Toggle this browser's RSVP
  - GET    /events/{{id}}/rsvp?fingerprint= - Whether this browser is attending
  - GET    /events/{{id}}/rsvp/count        - Attending count
  - GET    /health                        - Light health check
  - GET    /health?mode=full              - Full health check (store and cache)
  - GET    /metrics                       - Prometheus metrics
"#
    )
}
