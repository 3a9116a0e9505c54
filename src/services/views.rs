// Derived read views assembled from several tables and cached as JSON.
//
// Each builder loads its base rows, fetches related rows by id list and
// merges them in memory. Results go through `ViewCache` under the keys in
// `cache::keys`; write services invalidate those keys.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Datelike;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::cache::keys;
use crate::database::models::*;
use crate::error::ApiError;

/// Cached view of type `T`, built by `build` on a miss.
pub async fn cached<T, F, Fut>(state: &AppState, key: &str, build: F) -> Result<T, ApiError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    let value = state
        .cache
        .get_or_try_insert(key, || async {
            let view = build().await?;
            serde_json::to_value(&view).map_err(|e| {
                tracing::error!("Failed to serialise view {}: {}", key, e);
                ApiError::internal_server_error("Failed to build view")
            })
        })
        .await?;

    serde_json::from_value(value).map_err(|e| {
        tracing::error!("Cached view {} has an unexpected shape: {}", key, e);
        ApiError::internal_server_error("Failed to read view")
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub map_info_id: Uuid,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    /// `None` for points flagged `no_address`.
    pub fn from_map_info(map_info: &MapInfo) -> Option<Self> {
        if map_info.no_address {
            return None;
        }
        Some(Self {
            map_info_id: map_info.id,
            address: map_info.address.clone(),
            latitude: map_info.latitude,
            longitude: map_info.longitude,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Participant,
    Hub,
}

/// One pin on the site map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub kind: PointKind,
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub display_number: Option<String>,
    pub map_info_id: Uuid,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Accepted participants with coordinates, then hubs at their host's location.
pub async fn map(state: &AppState) -> Result<Vec<MapPoint>, ApiError> {
    cached(state, keys::MAP, || build_map(state)).await
}

async fn build_map(state: &AppState) -> Result<Vec<MapPoint>, ApiError> {
    let participants = accepted(state).await?;
    let points: HashMap<Uuid, MapInfo> = state
        .store
        .list_map_infos()
        .await?
        .into_iter()
        .filter_map(|m| m.user_id.map(|user_id| (user_id, m)))
        .collect();
    let names = user_names(state, participants.iter().map(|p| p.user_id)).await?;

    let mut out: Vec<MapPoint> = Vec::new();
    for p in &participants {
        let Some(point) = points.get(&p.user_id) else { continue };
        let Some((latitude, longitude)) = point.coordinates() else { continue };
        out.push(MapPoint {
            kind: PointKind::Participant,
            id: p.user_id,
            name: names.get(&p.user_id).cloned().unwrap_or_default(),
            slug: Some(p.slug.clone()),
            display_number: p.display_number.clone(),
            map_info_id: point.id,
            address: point.address.clone(),
            latitude,
            longitude,
        });
    }

    for hub in state.store.list_hubs().await? {
        let Some(point) = points.get(&hub.hub_host) else { continue };
        let Some((latitude, longitude)) = point.coordinates() else { continue };
        out.push(MapPoint {
            kind: PointKind::Hub,
            id: hub.id,
            name: hub.name,
            slug: None,
            display_number: hub.display_number,
            map_info_id: point.id,
            address: point.address.clone(),
            latitude,
            longitude,
        });
    }
    Ok(out)
}

/// Card shown in the participants and curated listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantCard {
    pub user_id: Uuid,
    pub slug: String,
    pub name: String,
    pub short_description: String,
    pub display_number: Option<String>,
    pub image_path: Option<String>,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearGroup<T> {
    pub year: i32,
    pub entries: Vec<T>,
}

pub async fn accepted_participants(state: &AppState) -> Result<Vec<ParticipantCard>, ApiError> {
    cached(state, keys::PARTICIPANTS, || async {
        let participants = accepted(state).await?;
        cards(state, participants).await
    })
    .await
}

/// Sticky accepted participants grouped by year, newest year first.
pub async fn curated_by_year(state: &AppState) -> Result<Vec<YearGroup<ParticipantCard>>, ApiError> {
    cached(state, keys::CURATED, || async {
        let sticky: Vec<ParticipantDetails> = accepted(state).await?.into_iter().filter(|p| p.is_sticky).collect();
        let cards = cards(state, sticky).await?;
        Ok(group_by_year(cards, |c| c.year))
    })
    .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citizen {
    pub user_id: Uuid,
    pub name: String,
}

/// Member-plan users grouped by the year they joined, newest year first.
/// A name appears once per year.
pub async fn citizens_by_year(state: &AppState) -> Result<Vec<YearGroup<Citizen>>, ApiError> {
    cached(state, keys::CITIZENS, || async {
        let mut members = state.store.list_users(Some(PlanType::Member)).await?;
        members.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let mut seen: HashSet<(i32, String)> = HashSet::new();
        let citizens: Vec<(i32, Citizen)> = members
            .into_iter()
            .filter(|u| seen.insert((u.created_at.year(), u.name.trim().to_lowercase())))
            .map(|u| {
                (
                    u.created_at.year(),
                    Citizen {
                        user_id: u.id,
                        name: u.name,
                    },
                )
            })
            .collect();

        let groups = group_by_year(citizens, |(year, _)| *year);
        Ok(groups
            .into_iter()
            .map(|g| YearGroup {
                year: g.year,
                entries: g.entries.into_iter().map(|(_, c)| c).collect(),
            })
            .collect())
    })
    .await
}

/// Stable grouping: entry order inside a year is preserved.
pub fn group_by_year<T>(entries: Vec<T>, year_of: impl Fn(&T) -> i32) -> Vec<YearGroup<T>> {
    let mut by_year: BTreeMap<i32, Vec<T>> = BTreeMap::new();
    for entry in entries {
        by_year.entry(year_of(&entry)).or_default().push(entry);
    }
    by_year
        .into_iter()
        .rev()
        .map(|(year, entries)| YearGroup { year, entries })
        .collect()
}

async fn accepted(state: &AppState) -> Result<Vec<ParticipantDetails>, ApiError> {
    Ok(state
        .store
        .list_participants()
        .await?
        .into_iter()
        .filter(|p| p.status == ParticipantStatus::Accepted)
        .collect())
}

async fn cards(state: &AppState, participants: Vec<ParticipantDetails>) -> Result<Vec<ParticipantCard>, ApiError> {
    let names = user_names(state, participants.iter().map(|p| p.user_id)).await?;
    Ok(participants
        .into_iter()
        .map(|p| ParticipantCard {
            name: names.get(&p.user_id).cloned().unwrap_or_default(),
            user_id: p.user_id,
            slug: p.slug,
            short_description: p.short_description,
            display_number: p.display_number,
            image_path: p.image_path,
            year: p.year,
        })
        .collect())
}

pub(crate) async fn user_names(
    state: &AppState,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, ApiError> {
    let ids: Vec<Uuid> = ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(state
        .store
        .users_by_ids(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect())
}
