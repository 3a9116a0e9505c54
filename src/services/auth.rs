use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{generate_jwt, verify_password, Claims};
use crate::database::models::{PlanType, UserRole};
use crate::error::ApiError;
use crate::schema::LoginPayload;

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub plan_type: PlanType,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_in: u64,
    pub user: SessionUser,
}

/// Check credentials and issue a session token. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login(state: &AppState, payload: &LoginPayload) -> Result<Session, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let identity = state.store.find_identity_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_password(&identity, &payload.password) {
        warn!("Failed login for {}", email);
        return Err(invalid());
    }
    let user = state.store.get_user(identity.id).await?.ok_or_else(invalid)?;

    let security = &state.config.security;
    let token = generate_jwt(&Claims::new(user.id, user.role, security), security).map_err(|e| {
        tracing::error!("Could not issue session token: {}", e);
        ApiError::internal_server_error("Could not create session")
    })?;
    info!("User {} logged in", user.id);

    Ok(Session {
        token,
        expires_in: security.jwt_expiry_hours * 3600,
        user: SessionUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            plan_type: user.plan_type,
        },
    })
}
