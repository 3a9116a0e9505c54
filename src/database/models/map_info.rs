use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A location on the site map. Owned by a user (participant or hub host),
/// or free-standing when created as a route waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MapInfo {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub no_address: bool,
}

impl MapInfo {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if !self.no_address => Some((lat, lng)),
            _ => None,
        }
    }
}
