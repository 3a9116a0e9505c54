// handlers/elevated/hubs.rs - hub management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::app::AppState;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema::{HubPayload, ValidJson};
use crate::services::hubs::{self, HubView};

/**
 * POST /hubs - Create a hub with its members
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Canal Hub",               // Required
 *   "description": "string",           // Optional
 *   "hub_host": "uuid",                // Required: an existing user
 *   "participants": ["uuid", "uuid"],  // Host is added automatically
 *   "display_number": "H1"             // Optional: unique across participants and hubs
 * }
 * ```
 *
 * The hub and its membership rows are stored together: if any member does
 * not exist, no hub is created.
 */
pub async fn hub_post(State(state): State<AppState>, ValidJson(payload): ValidJson<HubPayload>) -> ApiResult<HubView> {
    Ok(ApiResponse::created(hubs::create(&state, payload).await?))
}

pub async fn hub_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<HubPayload>,
) -> ApiResult<HubView> {
    let id = parse_id(&id, "hub")?;
    Ok(ApiResponse::success(hubs::update(&state, id, payload).await?))
}

pub async fn hub_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    hubs::delete(&state, parse_id(&id, "hub")?).await?;
    Ok(ApiResponse::with_status((), StatusCode::NO_CONTENT))
}
