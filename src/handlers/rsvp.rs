//! RSVP handlers: toggle, status lookup, attending count.

use crate::app_state::AppState;
use crate::handlers::shared_types::{
    api_error, rsvp_error, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleRequest {
    // ---
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    // ---
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceResponse {
    // ---
    pub attending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    // ---
    pub event_id: Uuid,
    pub count: i64,
}

/// Best-effort client address from proxy headers.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    // ---
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded.or_else(real_ip).map(str::to_string)
}

fn client_user_agent(headers: &HeaderMap) -> Option<String> {
    // ---
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /events/{id}/rsvp
///
/// Flips this browser's RSVP for the event, creating it if absent.
///
/// # Request Body
/// ```json
/// { "fingerprint": "0123456789abcdef0123456789abcdef" }
/// ```
/// `ip_address` and `user_agent` are optional; when omitted they are taken
/// from `X-Forwarded-For`/`X-Real-IP` and `User-Agent`.
///
/// # Responses
/// - `200 OK` with `{ "data": { "attending": bool } }`
/// - `400 Bad Request` for an empty fingerprint
/// - `404 Not Found` if the event does not exist
#[tracing::instrument(skip(state, headers, req))]
pub async fn toggle_rsvp(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ToggleRequest>,
) -> Result<ApiResponse<AttendanceResponse>, ApiError> {
    // ---
    let ip_address = req.ip_address.or_else(|| client_ip(&headers));
    let user_agent = req.user_agent.or_else(|| client_user_agent(&headers));

    let attending = state
        .rsvp()
        .toggle_rsvp(event_id, &req.fingerprint, ip_address, user_agent)
        .await
        .map_err(rsvp_error)?;

    Ok(ApiResponse {
        data: AttendanceResponse { attending },
    })
}

/// GET /events/{id}/rsvp?fingerprint=...
///
/// Whether this browser currently holds an `attending` RSVP.
#[tracing::instrument(skip(state, query))]
pub async fn rsvp_status(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<ApiResponse<AttendanceResponse>, ApiError> {
    // ---
    let fingerprint = query
        .fingerprint
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing fingerprint query parameter"))?;

    let attending = state
        .rsvp()
        .get_attending_status(event_id, &fingerprint)
        .await
        .map_err(rsvp_error)?;

    Ok(ApiResponse {
        data: AttendanceResponse { attending },
    })
}

/// GET /events/{id}/rsvp/count
///
/// Number of `attending` RSVPs. Unknown events simply count zero.
#[tracing::instrument(skip(state))]
pub async fn rsvp_count(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<ApiResponse<CountResponse>, ApiError> {
    // ---
    let count = state
        .rsvp()
        .get_attending_count(event_id)
        .await
        .map_err(rsvp_error)?;

    Ok(ApiResponse {
        data: CountResponse { event_id, count },
    })
}
