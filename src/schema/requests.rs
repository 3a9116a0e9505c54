use serde::Deserialize;
use uuid::Uuid;

use super::{display_number, email, required, Validate, ValidationError};

pub const MAX_DELETE_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Participant,
    Hub,
}

/// `POST /check-display-number`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNumberCheck {
    pub display_number: String,
    pub entity_type: EntityType,
    /// Record being edited; its own number does not count as taken.
    #[serde(default)]
    pub entity_id: Option<Uuid>,
}

impl Validate for DisplayNumberCheck {
    fn validate(&self) -> Result<(), ValidationError> {
        display_number("displayNumber", self.display_number.trim())
    }
}

/// `POST /deleteUsers`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUsersPayload {
    pub user_ids: Vec<Uuid>,
}

impl Validate for DeleteUsersPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.user_ids.is_empty() {
            return Err(ValidationError::new("userIds", "must contain at least one id"));
        }
        if self.user_ids.len() > MAX_DELETE_BATCH {
            return Err(ValidationError::new("userIds", format!("at most {} ids per call", MAX_DELETE_BATCH)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

impl Validate for LoginPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        email("email", &self.email)?;
        required("password", &self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use serde_json::json;

    #[test]
    fn display_number_check_uses_camel_case() {
        let check: DisplayNumberCheck = parse(json!({ "displayNumber": "3B", "entityType": "hub" })).unwrap();
        assert_eq!(check.entity_type, EntityType::Hub);
        assert!(check.entity_id.is_none());
    }

    #[test]
    fn delete_users_requires_ids() {
        let err = parse::<DeleteUsersPayload>(json!({ "userIds": [] })).unwrap_err();
        assert_eq!(err.field, "userIds");
    }
}
