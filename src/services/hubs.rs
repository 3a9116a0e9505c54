use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::views::{self, Location};
use crate::app::AppState;
use crate::cache::keys;
use crate::database::models::{Hub, HubParticipant};
use crate::error::ApiError;
use crate::schema::HubPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMember {
    pub user_id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub display_number: Option<String>,
}

/// Hub row with its members and the host's map location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubView {
    #[serde(flatten)]
    pub hub: Hub,
    pub participants: Vec<HubMember>,
    pub location: Option<Location>,
}

pub async fn list(state: &AppState) -> Result<Vec<HubView>, ApiError> {
    views::cached(state, keys::HUBS, || async {
        let hubs = state.store.list_hubs().await?;
        assemble(state, hubs).await
    })
    .await
}

pub async fn get(state: &AppState, id: Uuid) -> Result<HubView, ApiError> {
    let hub = state
        .store
        .get_hub(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hub not found"))?;
    let mut views = assemble(state, vec![hub]).await?;
    views.pop().ok_or_else(|| ApiError::not_found("Hub not found"))
}

/// Hub row and membership rows are written together or not at all.
pub async fn create(state: &AppState, payload: HubPayload) -> Result<HubView, ApiError> {
    let hub = to_hub(Uuid::new_v4(), &payload);
    let saved = state.store.insert_hub(&hub, &payload.members()).await?;
    info!("Created hub {} ({})", saved.name, saved.id);
    invalidate(state).await;
    get(state, saved.id).await
}

pub async fn update(state: &AppState, id: Uuid, payload: HubPayload) -> Result<HubView, ApiError> {
    let hub = to_hub(id, &payload);
    state.store.update_hub(&hub, &payload.members()).await?;
    info!("Updated hub {}", id);
    invalidate(state).await;
    get(state, id).await
}

pub async fn delete(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    state.store.delete_hub(id).await?;
    info!("Deleted hub {}", id);
    invalidate(state).await;
    Ok(())
}

async fn invalidate(state: &AppState) {
    state.cache.invalidate(&[keys::HUBS, keys::MAP]).await;
}

fn to_hub(id: Uuid, payload: &HubPayload) -> Hub {
    Hub {
        id,
        name: payload.name.trim().to_string(),
        description: payload.description.clone(),
        hub_host: payload.hub_host,
        display_number: payload.display_number.as_ref().map(|n| n.trim().to_string()),
        created_at: Utc::now(),
    }
}

/// Join hubs with members, member names and slugs, and host locations.
async fn assemble(state: &AppState, hubs: Vec<Hub>) -> Result<Vec<HubView>, ApiError> {
    let hub_ids: Vec<Uuid> = hubs.iter().map(|h| h.id).collect();
    let memberships: Vec<HubParticipant> = state.store.hub_participants(&hub_ids).await?;

    let mut member_ids: Vec<Uuid> = memberships.iter().map(|m| m.user_id).collect();
    member_ids.extend(hubs.iter().map(|h| h.hub_host));
    member_ids.sort();
    member_ids.dedup();

    let names = views::user_names(state, member_ids.iter().copied()).await?;
    let mut details = HashMap::new();
    for id in &member_ids {
        if let Some(d) = state.store.get_participant(*id).await? {
            details.insert(*id, d);
        }
    }
    let mut locations = HashMap::new();
    for hub in &hubs {
        if let Some(m) = state.store.get_map_info_for_user(hub.hub_host).await? {
            locations.insert(hub.hub_host, m);
        }
    }

    Ok(hubs
        .into_iter()
        .map(|hub| {
            let participants = memberships
                .iter()
                .filter(|m| m.hub_id == hub.id)
                .map(|m| HubMember {
                    user_id: m.user_id,
                    name: names.get(&m.user_id).cloned().unwrap_or_default(),
                    slug: details.get(&m.user_id).map(|d| d.slug.clone()),
                    display_number: details.get(&m.user_id).and_then(|d| d.display_number.clone()),
                })
                .collect();
            let location = locations.get(&hub.hub_host).and_then(Location::from_map_info);
            HubView {
                hub,
                participants,
                location,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PlanType;
    use crate::services::testing;

    fn payload(host: Uuid, participants: Vec<Uuid>) -> HubPayload {
        HubPayload {
            name: "Canal Hub".into(),
            description: None,
            hub_host: host,
            participants,
            display_number: Some("H1".into()),
        }
    }

    #[tokio::test]
    async fn host_is_listed_as_member() {
        let state = testing::state();
        let host = testing::register(&state, PlanType::Participant, "Host").await;
        let guest = testing::register(&state, PlanType::Participant, "Guest").await;

        let hub = create(&state, payload(host, vec![guest])).await.unwrap();
        let members: Vec<Uuid> = hub.participants.iter().map(|m| m.user_id).collect();
        assert_eq!(members.len(), 2);
        assert!(members.contains(&host) && members.contains(&guest));
        assert_eq!(list(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_membership_write_leaves_no_hub() {
        let state = testing::state();
        let host = testing::register(&state, PlanType::Participant, "Host").await;

        let err = create(&state, payload(host, vec![Uuid::new_v4()])).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(state.store.list_hubs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_members_and_invalidates_list() {
        let state = testing::state();
        let host = testing::register(&state, PlanType::Participant, "Host").await;
        let guest = testing::register(&state, PlanType::Participant, "Guest").await;
        let hub = create(&state, payload(host, vec![guest])).await.unwrap();
        assert_eq!(list(&state).await.unwrap()[0].participants.len(), 2);

        update(&state, hub.hub.id, payload(host, vec![])).await.unwrap();
        assert_eq!(list(&state).await.unwrap()[0].participants.len(), 1);
    }

    #[tokio::test]
    async fn unknown_hub_is_404() {
        let state = testing::state();
        assert_eq!(get(&state, Uuid::new_v4()).await.unwrap_err().status_code(), 404);
        assert_eq!(delete(&state, Uuid::new_v4()).await.unwrap_err().status_code(), 404);
    }
}
