// handlers/public/site.rs - read-only site endpoints
//
// GET  /plans                    active and inactive plans, by id
// GET  /events[?organizer=<id>]  events, optionally for one organiser
// GET  /events/:id
// GET  /hubs, /hubs/:id          hubs with members and host location
// GET  /maps                     map pins for participants and hubs
// GET  /maps/routes[/:id]        routes with ordered dots
// GET  /about/:section           editable and derived site sections
// GET  /participants/:slug       public participant profile
// GET  /storage/*path            stored files
// POST /check-display-number     availability of a display number

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Event, Plan};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{session_user, ApiResponse, ApiResult};
use crate::schema::{DisplayNumberCheck, ValidJson};
use crate::services::content::SectionView;
use crate::services::display_numbers::{self, Availability};
use crate::services::hubs::{self, HubView};
use crate::services::participants::{self, ParticipantProfile};
use crate::services::routes::{self, RouteView};
use crate::services::views::{self, MapPoint};
use crate::services::{content, events, plans};
use crate::storage::FileStorage;

pub async fn plans_list(State(state): State<AppState>) -> ApiResult<Vec<Plan>> {
    Ok(ApiResponse::success(plans::list(&state).await?))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub organizer: Option<String>,
}

pub async fn events_list(State(state): State<AppState>, Query(query): Query<EventsQuery>) -> ApiResult<Vec<Event>> {
    let organizer = query.organizer.as_deref().map(|raw| parse_id(raw, "organizer")).transpose()?;
    Ok(ApiResponse::success(events::list(&state, organizer).await?))
}

pub async fn event_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    let id = parse_id(&id, "event")?;
    Ok(ApiResponse::success(events::get(&state, id).await?))
}

pub async fn hubs_list(State(state): State<AppState>) -> ApiResult<Vec<HubView>> {
    Ok(ApiResponse::success(hubs::list(&state).await?))
}

pub async fn hub_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<HubView> {
    let id = parse_id(&id, "hub")?;
    Ok(ApiResponse::success(hubs::get(&state, id).await?))
}

pub async fn map_get(State(state): State<AppState>) -> ApiResult<Vec<MapPoint>> {
    Ok(ApiResponse::success(views::map(&state).await?))
}

pub async fn routes_list(State(state): State<AppState>) -> ApiResult<Vec<RouteView>> {
    Ok(ApiResponse::success(routes::list(&state).await?))
}

pub async fn route_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<RouteView> {
    let id = parse_id(&id, "route")?;
    Ok(ApiResponse::success(routes::get(&state, id).await?))
}

/// GET /about/:section - a session is optional here and only matters for
/// staff-only sections.
pub async fn section_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(section): Path<String>,
) -> ApiResult<SectionView> {
    let viewer = session_user(&headers, &state.config.security);
    Ok(ApiResponse::success(
        content::get_section(&state, viewer.as_ref(), &section).await?,
    ))
}

pub async fn participant_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<ParticipantProfile> {
    Ok(ApiResponse::success(participants::public_profile(&state, &slug).await?))
}

pub async fn storage_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.storage.get(&path).await?;
    let content_type = HeaderValue::from_static(FileStorage::content_type(&path));
    Ok(([(header::CONTENT_TYPE, content_type)], Body::from(bytes)).into_response())
}

/**
 * POST /check-display-number - Is a display number free for this entity?
 *
 * Expected Input:
 * ```json
 * { "displayNumber": "3B", "entityType": "participant", "entityId": "uuid" }
 * ```
 *
 * Expected Output:
 * ```json
 * { "isAvailable": true }
 * ```
 */
pub async fn check_display_number(
    State(state): State<AppState>,
    ValidJson(check): ValidJson<DisplayNumberCheck>,
) -> ApiResult<Availability> {
    Ok(ApiResponse::success(display_numbers::check_available(&state, &check).await?))
}
