// handlers/elevated/users.rs - POST /deleteUsers handler

use axum::{extract::State, http::StatusCode, Extension};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::schema::{DeleteUsersPayload, ValidJson};
use crate::services::users::{self, BatchOutcome, DeleteReport};

/**
 * POST /deleteUsers - Delete several users
 *
 * Expected Input:
 * ```json
 * { "userIds": ["uuid", "uuid"] }
 * ```
 *
 * Expected Output (207 when some deletions failed):
 * ```json
 * {
 *   "results": [
 *     { "userId": "uuid", "success": true },
 *     { "userId": "uuid", "success": false, "error": "User not found" }
 *   ]
 * }
 * ```
 *
 * 200 when every deletion succeeded, 500 when none did.
 */
pub async fn delete_users(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(payload): ValidJson<DeleteUsersPayload>,
) -> ApiResult<DeleteReport> {
    let report = users::delete_many(&state, Some(&caller), &payload.user_ids).await?;
    let response = match report.outcome() {
        BatchOutcome::AllSucceeded => ApiResponse::success(report),
        BatchOutcome::Partial => ApiResponse::multi_status(report),
        BatchOutcome::AllFailed => ApiResponse::with_status(report, StatusCode::INTERNAL_SERVER_ERROR),
    };
    Ok(response)
}
