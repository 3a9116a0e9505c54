use serde::Deserialize;
use uuid::Uuid;

use super::{display_number, max_len, optional_nonblank, required, Validate, ValidationError};

/// Hub body. The host is always stored as a participant of the hub.
#[derive(Debug, Clone, Deserialize)]
pub struct HubPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub hub_host: Uuid,
    #[serde(default)]
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub display_number: Option<String>,
}

impl HubPayload {
    /// Participants with the host included and duplicates removed, order kept.
    pub fn members(&self) -> Vec<Uuid> {
        let mut members = vec![self.hub_host];
        for id in &self.participants {
            if !members.contains(id) {
                members.push(*id);
            }
        }
        members
    }
}

impl Validate for HubPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        max_len("name", &self.name, 120)?;
        optional_nonblank("description", &self.description)?;
        if let Some(n) = &self.display_number {
            display_number("display_number", n)?;
        }
        Ok(())
    }
}
