// handlers/protected/events.rs - event write handlers
//
// POST   /events       create, organised by the caller
// PUT    /events/:id   replace (organiser, co-organisers, staff)
// DELETE /events/:id   delete (organiser, staff)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};

use crate::app::AppState;
use crate::database::models::Event;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::schema::{EventPayload, ValidJson};
use crate::services::events;

/**
 * POST /events - Create an event
 *
 * Expected Input:
 * ```json
 * {
 *   "title": "Open studio",           // Required
 *   "day": "2024-09-14",              // Required
 *   "event_type": "workshop",         // Required
 *   "start_time": "14:00",            // Optional, HH:MM
 *   "end_time": "17:00",              // Optional, after start_time
 *   "rsvp": true,                     // rsvp_message and rsvp_link required together
 *   "rsvp_message": "Book a seat",
 *   "rsvp_link": "https://tickets.example.org",
 *   "co_organizers": ["uuid"]         // At most 4
 * }
 * ```
 */
pub async fn event_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(payload): ValidJson<EventPayload>,
) -> ApiResult<Event> {
    Ok(ApiResponse::created(events::create(&state, &caller, payload).await?))
}

pub async fn event_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<EventPayload>,
) -> ApiResult<Event> {
    let id = parse_id(&id, "event")?;
    Ok(ApiResponse::success(events::update(&state, &caller, id, payload).await?))
}

pub async fn event_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "event")?;
    events::delete(&state, &caller, id).await?;
    Ok(ApiResponse::with_status((), StatusCode::NO_CONTENT))
}
