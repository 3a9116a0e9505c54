// handlers/elevated/plans.rs - plan management handlers
//
// POST   /plans              create under the next planId-N
// PUT    /plans?plan=<id>    full replace
// DELETE /plans?plan=<id>

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Plan;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema::{PlanPayload, ValidJson};
use crate::services::plans;

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub plan: Option<String>,
}

impl PlanQuery {
    fn plan_id(&self) -> Result<&str, ApiError> {
        self.plan
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::bad_request("Missing 'plan' query parameter"))
    }
}

/**
 * POST /plans - Create a plan
 *
 * Expected Input:
 * ```json
 * {
 *   "label": "Member",             // Required
 *   "price": "25.00",              // Required, not negative
 *   "currency": "EUR",             // Required, ISO 4217
 *   "features": ["Newsletter"],    // Optional
 *   "is_active": true,             // Optional, default true
 *   "is_featured": false           // Optional
 * }
 * ```
 */
pub async fn plan_post(State(state): State<AppState>, ValidJson(payload): ValidJson<PlanPayload>) -> ApiResult<Plan> {
    Ok(ApiResponse::created(plans::create(&state, payload).await?))
}

pub async fn plan_put(
    State(state): State<AppState>,
    Query(query): Query<PlanQuery>,
    ValidJson(payload): ValidJson<PlanPayload>,
) -> ApiResult<Plan> {
    let plan_id = query.plan_id()?;
    Ok(ApiResponse::success(plans::update(&state, plan_id, payload).await?))
}

pub async fn plan_delete(State(state): State<AppState>, Query(query): Query<PlanQuery>) -> ApiResult<()> {
    plans::delete(&state, query.plan_id()?).await?;
    Ok(ApiResponse::with_status((), StatusCode::NO_CONTENT))
}
