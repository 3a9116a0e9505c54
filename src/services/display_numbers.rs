use serde::Serialize;

use crate::app::AppState;
use crate::database::DisplayNumberOwner;
use crate::error::ApiError;
use crate::schema::{DisplayNumberCheck, EntityType};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub is_available: bool,
}

/// A number is available when nobody holds it, or only the entity being
/// edited does. Advisory only: the write itself still enforces uniqueness.
pub async fn check_available(state: &AppState, check: &DisplayNumberCheck) -> Result<Availability, ApiError> {
    let owners = state.store.display_number_owners(check.display_number.trim()).await?;
    let own = check.entity_id.map(|id| match check.entity_type {
        EntityType::Participant => DisplayNumberOwner::Participant(id),
        EntityType::Hub => DisplayNumberOwner::Hub(id),
    });

    let is_available = owners.iter().all(|owner| Some(*owner) == own);
    Ok(Availability { is_available })
}
