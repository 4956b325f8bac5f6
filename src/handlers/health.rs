use crate::app_state::AppState;
use crate::handlers::shared_types::ApiQuery;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    status: String,
}

#[derive(Deserialize)]
pub struct HealthQuery {
    mode: Option<String>,
}

fn respond(status: StatusCode, text: &str) -> (StatusCode, Json<HealthResponse>) {
    (
        status,
        Json(HealthResponse {
            status: text.to_string(),
        }),
    )
}

/// Responds with the health status of the server.
///
/// - By default (no query parameters), performs a light check to confirm the web server
///   is running.
///
/// - If `mode=full` is passed as a query parameter, also pings the repository and the
///   count cache.
///
/// # Responses
/// - `200 OK` with `{ "status": "ok" }` if server (and backends, in full mode) are healthy.
/// - `500 INTERNAL SERVER ERROR` with `{ "status": "error" }` if a backend check fails.
pub async fn health_check(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HealthQuery>,
) -> (StatusCode, Json<HealthResponse>) {
    match params.mode.as_deref() {
        Some("full") => {
            if let Err(err) = state.repository().ping().await {
                tracing::error!("Repository health check failed: {err:#}");
                return respond(StatusCode::INTERNAL_SERVER_ERROR, "error");
            }
            if let Err(err) = state.count_cache().ping().await {
                tracing::error!("Count cache health check failed: {err:#}");
                return respond(StatusCode::INTERNAL_SERVER_ERROR, "error");
            }
            respond(StatusCode::OK, "ok")
        }
        _ => respond(StatusCode::OK, "ok"),
    }
}
