// handlers/public/auth/logout.rs - POST /auth/logout handler

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::app::AppState;
use crate::middleware::clear_session_cookie;

/// POST /auth/logout - expire the session cookie. Always succeeds; tokens are
/// stateless, so a copied Bearer token stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie(&state.config.security);
    let mut response = Json(json!({ "success": true })).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
