use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    Zone {
        North => "north",
        South => "south",
        East => "east",
        West => "west",
        Central => "central",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub zone: Zone,
    pub created_at: DateTime<Utc>,
}

/// One waypoint of a route; `step` orders the dots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RouteDot {
    pub route_id: Uuid,
    pub map_info_id: Uuid,
    pub step: i32,
}
