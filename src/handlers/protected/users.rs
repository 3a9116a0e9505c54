// handlers/protected/users.rs - GET /users/:id handler

use axum::{
    extract::{Path, State},
    Extension,
};

use crate::app::AppState;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::users::{self, CombinedUser};

/**
 * GET /users/:id - Profile with invoice, participant details and map info
 *
 * Owners read their own record; staff read anyone's. Records the user does
 * not have are omitted rather than returned as null.
 *
 * Expected Output:
 * ```json
 * {
 *   "id": "uuid", "email": "...", "name": "...", "plan_type": "participant", ...,
 *   "invoice": { ... },
 *   "participantDetails": { "slug": "studio-north", ... }
 * }
 * ```
 */
pub async fn user_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<CombinedUser> {
    let id = parse_id(&id, "user")?;
    Ok(ApiResponse::success(users::get_combined(&state, &caller, id).await?))
}
