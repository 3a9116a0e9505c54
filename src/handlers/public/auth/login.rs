// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Json, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::session_cookie;
use crate::schema::{LoginPayload, ValidJson};
use crate::services::auth;

/**
 * POST /auth/login - Authenticate and receive a session
 *
 * Expected Input:
 * ```json
 * { "email": "admin@example.org", "password": "correct horse" }
 * ```
 *
 * Expected Output (Success), plus a `Set-Cookie` carrying the same token:
 * ```json
 * {
 *   "token": "eyJhbGciOiJIUzI1NiI...",
 *   "expires_in": 86400,
 *   "user": { "id": "uuid", "email": "...", "name": "...", "role": "admin", "plan_type": "free" }
 * }
 * ```
 */
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginPayload>,
) -> Result<Response, ApiError> {
    let session = auth::login(&state, &payload).await?;

    let cookie = session_cookie(&session.token, &state.config.security);
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&cookie).map_err(|_| ApiError::internal_server_error("Could not create session"))?;
    headers.insert(header::SET_COOKIE, value);

    Ok((headers, Json(session)).into_response())
}
