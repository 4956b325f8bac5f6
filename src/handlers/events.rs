//! Event listing, details, and admin create/delete handlers.

use crate::app_state::AppState;
use crate::domain::{
    group_by_status, Event, EventFilters, EventPage, EventWithRsvpCount, GroupedEvents, NewEvent,
    Pagination,
};
use crate::handlers::shared_types::{api_error, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse};
use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

fn backend_error(context: &str, err: anyhow::Error) -> ApiError {
    // ---
    tracing::error!("{context}: {err:#}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{context}: {err}"))
}

/// GET /events?status=&event_type=&search=&page=&limit=
///
/// One page of events with RSVP counts. `status` defaults to `all`, `page`
/// to 1 and `limit` to 20. Ordered by date, newest first only for `past`.
#[tracing::instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<EventFilters>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<ApiResponse<EventPage>, ApiError> {
    // ---
    let page = state
        .repository()
        .list_events(&filters, pagination)
        .await
        .map_err(|e| backend_error("Failed to fetch events", e))?;

    Ok(ApiResponse { data: page })
}

/// GET /events/by-status
///
/// All events grouped into upcoming, ongoing and past.
pub async fn events_by_status(
    State(state): State<AppState>,
) -> Result<ApiResponse<GroupedEvents>, ApiError> {
    // ---
    let events = state
        .repository()
        .all_events()
        .await
        .map_err(|e| backend_error("Failed to fetch events by status", e))?;

    Ok(ApiResponse {
        data: group_by_status(events),
    })
}

/// GET /events/{id}
///
/// - `200 OK` with the event and its RSVP count
/// - `404 Not Found` if no such event exists
#[tracing::instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<ApiResponse<EventWithRsvpCount>, ApiError> {
    // ---
    let event = state
        .repository()
        .get_event(event_id)
        .await
        .map_err(|e| backend_error("Failed to fetch event details", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Event not found: {event_id}")))?;

    Ok(ApiResponse { data: event })
}

/// POST /events
///
/// Creates an event in status `upcoming`.
///
/// - `201 Created` with the stored event
/// - `400 Bad Request` if the payload fails validation
#[tracing::instrument(skip(state, new_event))]
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(new_event): ApiJson<NewEvent>,
) -> Result<(StatusCode, ApiResponse<Event>), ApiError> {
    // ---
    new_event
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let event = state
        .repository()
        .create_event(new_event)
        .await
        .map_err(|e| backend_error("Failed to create event", e))?;

    tracing::info!("Created event {} ({})", event.id, event.name);

    Ok((StatusCode::CREATED, ApiResponse { data: event }))
}

/// DELETE /events/{id}
///
/// Deletes the event together with all of its RSVPs.
///
/// - `204 No Content` on success
/// - `404 Not Found` if no such event exists
#[tracing::instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    // ---
    let deleted = state
        .repository()
        .delete_event(event_id)
        .await
        .map_err(|e| backend_error("Failed to delete event", e))?;

    state.rsvp().invalidate_count(event_id).await;

    if deleted {
        tracing::info!("Deleted event {event_id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Event not found: {event_id}"),
        ))
    }
}
