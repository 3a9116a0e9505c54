use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::cache::keys;
use crate::database::models::{InvoiceData, MapInfo, ParticipantDetails, UserInfo};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::storage;

/// Profile row merged with every optional one-to-one record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedUser {
    #[serde(flatten)]
    pub user: UserInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_details: Option<ParticipantDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_info: Option<MapInfo>,
}

pub async fn get_combined(state: &AppState, caller: &AuthUser, id: Uuid) -> Result<CombinedUser, ApiError> {
    caller.ensure_can_act_for(id)?;
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(CombinedUser {
        invoice: state.store.get_invoice(id).await?,
        participant_details: state.store.get_participant(id).await?,
        map_info: state.store.get_map_info_for_user(id).await?,
        user,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub user_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    AllSucceeded,
    Partial,
    AllFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub results: Vec<DeleteResult>,
}

impl DeleteReport {
    pub fn outcome(&self) -> BatchOutcome {
        let ok = self.results.iter().filter(|r| r.success).count();
        match ok {
            0 => BatchOutcome::AllFailed,
            n if n == self.results.len() => BatchOutcome::AllSucceeded,
            _ => BatchOutcome::Partial,
        }
    }
}

/// Delete each user independently; one failure never stops the rest.
/// Stored files of deleted users are removed afterwards, best effort.
pub async fn delete_many(state: &AppState, caller: Option<&AuthUser>, ids: &[Uuid]) -> Result<DeleteReport, ApiError> {
    if ids.is_empty() {
        return Err(ApiError::bad_request("No user ids given"));
    }

    let mut results = Vec::with_capacity(ids.len());
    let mut files: Vec<String> = Vec::new();

    for id in ids {
        if caller.is_some_and(|c| c.user_id == *id) {
            results.push(failure(*id, "You cannot delete your own account"));
            continue;
        }
        match state.store.delete_user(*id).await {
            Ok(paths) => {
                files.extend(storage::owned_paths(paths, &storage::user_folder(*id)));
                results.push(DeleteResult {
                    user_id: *id,
                    success: true,
                    error: None,
                });
            }
            Err(DatabaseError::NotFound(_)) => results.push(failure(*id, "User not found")),
            Err(DatabaseError::ForeignKey(constraint)) => {
                warn!("User {} is still referenced ({})", id, constraint);
                results.push(failure(*id, "User still hosts a hub or anchors a route stop"));
            }
            Err(e) => {
                let api: ApiError = e.into();
                results.push(failure(*id, api.message()));
            }
        }
    }

    state.storage.delete_best_effort(&files).await;
    state.cache.invalidate(keys::PEOPLE).await;

    let report = DeleteReport { results };
    info!(
        "Deleted {}/{} users",
        report.results.iter().filter(|r| r.success).count(),
        report.results.len()
    );
    Ok(report)
}

fn failure(user_id: Uuid, message: &str) -> DeleteResult {
    DeleteResult {
        user_id,
        success: false,
        error: Some(message.to_string()),
    }
}
