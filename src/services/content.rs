// Editable site sections served under /about/:section.
//
// Item sections (press, sponsors, international, email-templates) keep a
// header document plus an ordered item list; a PUT carries the complete
// desired state and is diffed by item id. Derived sections (citizens,
// curated, participants) store an editable header and compute their body.

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use super::views::{self, Citizen, ParticipantCard, YearGroup};
use crate::app::AppState;
use crate::database::models::{ContentItem, ContentSection};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::schema::{SectionKind, SectionPayload};
use crate::storage;

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub id: Uuid,
    pub position: i32,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    pub image_path: Option<String>,
}

impl From<ContentItem> for ItemView {
    fn from(item: ContentItem) -> Self {
        let data = match item.data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: item.id,
            position: item.position,
            data,
            image_path: item.image_path,
        }
    }
}

/// Body computed from participant and user rows.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DerivedBody {
    ByYear(Vec<YearGroup<ParticipantCard>>),
    Citizens(Vec<YearGroup<Citizen>>),
    Participants(Vec<ParticipantCard>),
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub section: &'static str,
    pub header: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<DerivedBody>,
    pub updated_at: Option<chrono::DateTime<Utc>>,
}

fn parse_kind(slug: &str) -> Result<SectionKind, ApiError> {
    SectionKind::from_slug(slug).ok_or_else(|| ApiError::not_found(format!("Unknown section '{}'", slug)))
}

/// Email templates are readable by staff only; everything else is public.
pub async fn get_section(state: &AppState, viewer: Option<&AuthUser>, slug: &str) -> Result<SectionView, ApiError> {
    let kind = parse_kind(slug)?;
    if !kind.is_public() {
        match viewer {
            None => return Err(ApiError::unauthorized("Authentication required")),
            Some(user) if !user.is_staff() => return Err(ApiError::forbidden("Administrator access required")),
            Some(_) => {}
        }
    }

    let stored = state.store.get_section(kind.as_str()).await?;
    let items = if kind.has_items() {
        let rows = state.store.list_items(kind.as_str()).await?;
        Some(rows.into_iter().map(ItemView::from).collect())
    } else {
        None
    };
    let entries = match kind {
        SectionKind::Curated => Some(DerivedBody::ByYear(views::curated_by_year(state).await?)),
        SectionKind::Citizens => Some(DerivedBody::Citizens(views::citizens_by_year(state).await?)),
        SectionKind::Participants => Some(DerivedBody::Participants(views::accepted_participants(state).await?)),
        _ => None,
    };

    Ok(SectionView {
        section: kind.as_str(),
        header: stored.as_ref().map(|s| s.header.clone()).unwrap_or_else(|| Value::Object(Map::new())),
        items,
        entries,
        updated_at: stored.map(|s| s.updated_at),
    })
}

/// Replace a section's header and, for item sections, its whole item list.
/// Items keep their id when resent; omitted items are deleted together with
/// their images once the new state is committed.
pub async fn put_section(
    state: &AppState,
    viewer: Option<&AuthUser>,
    slug: &str,
    payload: SectionPayload,
) -> Result<SectionView, ApiError> {
    let kind = parse_kind(slug)?;
    payload.validate_for(kind)?;

    let previous = state.store.list_items(kind.as_str()).await?;
    let items = match &payload.items {
        Some(items) => {
            let known: HashSet<Uuid> = previous.iter().map(|i| i.id).collect();
            let mut rows = Vec::with_capacity(items.len());
            for (position, item) in items.iter().enumerate() {
                let id = match item.id {
                    Some(id) if known.contains(&id) => id,
                    Some(id) => return Err(ApiError::bad_request(format!("Item {} does not belong to this section", id))),
                    None => Uuid::new_v4(),
                };
                if let Some(path) = &item.image_path {
                    storage::check_within(path, kind.as_str())?;
                }
                rows.push(ContentItem {
                    id,
                    section: kind.as_str().to_string(),
                    position: position as i32,
                    data: Value::Object(item.data.clone()),
                    image_path: item.image_path.clone(),
                });
            }
            Some(rows)
        }
        None => None,
    };

    let section = ContentSection {
        section: kind.as_str().to_string(),
        header: Value::Object(payload.header.clone()),
        updated_at: Utc::now(),
    };
    let (_, saved) = state.store.save_section(&section, items.as_deref()).await?;

    if items.is_some() {
        let stale = storage::owned_paths(stale_images(&previous, &saved), kind.as_str());
        if !stale.is_empty() {
            info!("Removing {} stale image(s) from section {}", stale.len(), kind.as_str());
            state.storage.delete_best_effort(&stale).await;
        }
    }
    info!("Saved section {} ({} items)", kind.as_str(), saved.len());

    get_section(state, viewer, kind.as_str()).await
}

/// Images referenced before the save and by no item after it.
fn stale_images(previous: &[ContentItem], current: &[ContentItem]) -> Vec<String> {
    let kept: HashSet<&str> = current.iter().filter_map(|i| i.image_path.as_deref()).collect();
    let mut stale: Vec<String> = previous
        .iter()
        .filter_map(|i| i.image_path.as_deref())
        .filter(|path| !kept.contains(path))
        .map(str::to_string)
        .collect();
    stale.sort();
    stale.dedup();
    stale
}
