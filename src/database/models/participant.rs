use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    ParticipantStatus {
        Pending => "pending",
        Accepted => "accepted",
        Declined => "declined",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParticipantDetails {
    pub user_id: Uuid,
    /// Public URL segment, unique across participants.
    pub slug: String,
    pub short_description: String,
    pub long_description: Option<String>,
    /// Curated flag for the yearly showcase.
    pub is_sticky: bool,
    pub status: ParticipantStatus,
    pub year: i32,
    /// Map label, unique across participants and hubs.
    pub display_number: Option<String>,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OpeningHours {
    pub user_id: Uuid,
    pub position: i32,
    pub day: String,
    pub opens_at: String,
    pub closes_at: String,
}
