use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Hub {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub hub_host: Uuid,
    pub display_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HubParticipant {
    pub hub_id: Uuid,
    pub user_id: Uuid,
}
