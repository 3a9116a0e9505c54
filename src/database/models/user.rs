use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Discriminator controlling which related records a user must have.
    PlanType {
        Free => "free",
        Member => "member",
        Participant => "participant",
    }
}

impl PlanType {
    pub fn requires_invoice(&self) -> bool {
        matches!(self, PlanType::Member | PlanType::Participant)
    }
}

text_enum! {
    UserRole {
        User => "user",
        Moderator => "moderator",
        Admin => "admin",
    }
}

impl UserRole {
    /// Moderators and admins manage global site content.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Moderator | UserRole::Admin)
    }
}

/// Login credentials; the id is shared with the `user_info` profile row.
#[derive(Debug, Clone, FromRow)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub plan_id: Option<String>,
    pub plan_type: PlanType,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
