use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{validate_jwt, Claims};
use crate::config::SecurityConfig;
use crate::database::models::UserRole;
use crate::error::ApiError;

/// Authenticated user context extracted from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Owners manage their own records; staff manage everyone's.
    pub fn ensure_can_act_for(&self, owner: Uuid) -> Result<(), ApiError> {
        if self.user_id == owner || self.is_staff() {
            Ok(())
        } else {
            Err(ApiError::forbidden("You may only manage your own records"))
        }
    }
}

/// Session middleware: requires a valid token and injects `AuthUser`
pub async fn require_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let security = &state.config.security;

    let token = extract_token(&headers, security).ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let claims = validate_jwt(&token, security).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        ApiError::unauthorized("Invalid or expired session")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Staff gate, layered inside `require_session`
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.is_staff() {
        return Err(ApiError::forbidden("Administrator access required"));
    }

    Ok(next.run(request).await)
}

/// Session of a caller on a public route, if they sent a valid one.
pub fn session_user(headers: &HeaderMap, security: &SecurityConfig) -> Option<AuthUser> {
    let token = extract_token(headers, security)?;
    validate_jwt(&token, security).ok().map(AuthUser::from)
}

/// Token from the session cookie, or from a `Bearer` Authorization header
fn extract_token(headers: &HeaderMap, security: &SecurityConfig) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == security.session_cookie)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// `Set-Cookie` value carrying a fresh session token
pub fn session_cookie(token: &str, security: &SecurityConfig) -> String {
    let max_age = security.jwt_expiry_hours * 3600;
    let secure = if security.secure_cookie { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        security.session_cookie, token, max_age, secure
    )
}

/// `Set-Cookie` value that clears the session
pub fn clear_session_cookie(security: &SecurityConfig) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", security.session_cookie)
}
