use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Header document of an editable site section (About, Press, Terms, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContentSection {
    pub section: String,
    pub header: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContentItem {
    pub id: Uuid,
    pub section: String,
    pub position: i32,
    pub data: Value,
    pub image_path: Option<String>,
}
