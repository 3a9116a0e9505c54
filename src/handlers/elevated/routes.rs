// handlers/elevated/routes.rs - map route management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::app::AppState;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema::{RoutePayload, ValidJson};
use crate::services::routes::{self, RouteView};

/**
 * POST /maps/routes - Create a route
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Canal walk",
 *   "description": "string",
 *   "zone": "central",                                  // north | south | east | west | central
 *   "dots": [{ "map_info_id": "uuid", "step": 0 }, ...] // Non-empty, unique steps
 * }
 * ```
 */
pub async fn route_post(State(state): State<AppState>, ValidJson(payload): ValidJson<RoutePayload>) -> ApiResult<RouteView> {
    Ok(ApiResponse::created(routes::create(&state, payload).await?))
}

pub async fn route_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<RoutePayload>,
) -> ApiResult<RouteView> {
    let id = parse_id(&id, "route")?;
    Ok(ApiResponse::success(routes::update(&state, id, payload).await?))
}

pub async fn route_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    routes::delete(&state, parse_id(&id, "route")?).await?;
    Ok(ApiResponse::with_status((), StatusCode::NO_CONTENT))
}
