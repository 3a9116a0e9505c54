use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub co_organizers: Vec<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub day: String,
    pub event_type: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub rsvp: bool,
    pub rsvp_message: Option<String>,
    pub rsvp_link: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_organized_by(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id || self.co_organizers.contains(&user_id)
    }
}
