// Self-service participant records: profile details, opening hours, account
// info, invoice address and map location. Owners manage their own rows and
// staff manage everyone's.

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::slugs;
use super::views::Location;
use crate::app::AppState;
use crate::cache::keys;
use crate::database::constraints;
use crate::database::models::*;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::schema::{HoursPayload, InvoicePayload, MapInfoPayload, ParticipantDetailsPayload, UserInfoPayload};
use crate::storage;

async fn require_user(state: &AppState, user_id: Uuid) -> Result<UserInfo, ApiError> {
    state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

async fn require_details(state: &AppState, user_id: Uuid) -> Result<ParticipantDetails, ApiError> {
    state
        .store
        .get_participant(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Participant details not found"))
}

// Details

pub async fn get_details(state: &AppState, caller: &AuthUser, user_id: Uuid) -> Result<ParticipantDetails, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    require_details(state, user_id).await
}

/// Create the participant row for a participant-plan user that has none yet.
pub async fn create_details(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    payload: ParticipantDetailsPayload,
) -> Result<ParticipantDetails, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    let user = require_user(state, user_id).await?;
    if user.plan_type != PlanType::Participant {
        return Err(ApiError::bad_request("User is not on a participant plan"));
    }
    if state.store.get_participant(user_id).await?.is_some() {
        return Err(ApiError::conflict("Participant details already exist"));
    }
    check_image(user_id, &payload)?;

    let mut details = ParticipantDetails {
        user_id,
        slug: String::new(),
        short_description: payload.short_description.trim().to_string(),
        long_description: payload.long_description.clone(),
        is_sticky: false,
        status: ParticipantStatus::Pending,
        year: payload.year.unwrap_or_else(|| Utc::now().year()),
        display_number: payload.display_number.clone(),
        image_path: payload.image_path.clone(),
    };
    apply_staff_fields(caller, &payload, &mut details);

    // An explicit slug is the caller's choice: a collision is theirs to fix.
    let candidates = match &payload.slug {
        Some(slug) => vec![slug.clone()],
        None => slugs::candidates(&slugs::slugify(&user.name), state.config.registration.slug_attempts),
    };

    for candidate in candidates {
        details.slug = candidate;
        match state.store.insert_participant(&details).await {
            Ok(saved) => {
                info!("Created participant details for {} ({})", user_id, saved.slug);
                state.cache.invalidate(keys::PEOPLE).await;
                return Ok(saved);
            }
            Err(e) if e.is_conflict_on(constraints::PARTICIPANT_SLUG) && payload.slug.is_none() => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::conflict("Slug is already taken"))
}

/// Full replace. Omitted `slug` and `year` keep their stored values; old
/// images are removed once the new row is saved.
pub async fn update_details(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    payload: ParticipantDetailsPayload,
) -> Result<ParticipantDetails, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    let current = require_details(state, user_id).await?;
    check_image(user_id, &payload)?;

    let mut details = ParticipantDetails {
        user_id,
        slug: payload.slug.clone().unwrap_or_else(|| current.slug.clone()),
        short_description: payload.short_description.trim().to_string(),
        long_description: payload.long_description.clone(),
        is_sticky: current.is_sticky,
        status: current.status,
        year: payload.year.unwrap_or(current.year),
        display_number: payload.display_number.clone(),
        image_path: payload.image_path.clone(),
    };
    apply_staff_fields(caller, &payload, &mut details);

    let saved = state.store.update_participant(&details).await?;
    if current.image_path.is_some() && current.image_path != saved.image_path {
        let stale = storage::owned_paths(current.image_path, &storage::user_folder(user_id));
        state.storage.delete_best_effort(&stale).await;
    }
    state.cache.invalidate(keys::PEOPLE).await;
    info!("Updated participant details for {}", user_id);
    Ok(saved)
}

fn check_image(user_id: Uuid, payload: &ParticipantDetailsPayload) -> Result<(), ApiError> {
    if let Some(path) = &payload.image_path {
        storage::check_within(path, &storage::user_folder(user_id))?;
    }
    Ok(())
}

fn apply_staff_fields(caller: &AuthUser, payload: &ParticipantDetailsPayload, details: &mut ParticipantDetails) {
    if !caller.is_staff() {
        return;
    }
    if let Some(sticky) = payload.is_sticky {
        details.is_sticky = sticky;
    }
    if let Some(status) = payload.status {
        details.status = status;
    }
}

// Opening hours

pub async fn get_hours(state: &AppState, caller: &AuthUser, user_id: Uuid) -> Result<Vec<OpeningHours>, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    require_details(state, user_id).await?;
    Ok(state.store.get_hours(user_id).await?)
}

pub async fn replace_hours(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    payload: HoursPayload,
) -> Result<Vec<OpeningHours>, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    require_details(state, user_id).await?;

    let rows: Vec<OpeningHours> = payload
        .hours
        .into_iter()
        .enumerate()
        .map(|(position, slot)| OpeningHours {
            user_id,
            position: position as i32,
            day: slot.day.trim().to_lowercase(),
            opens_at: slot.opens_at,
            closes_at: slot.closes_at,
        })
        .collect();
    Ok(state.store.replace_hours(user_id, &rows).await?)
}

// Account info

pub async fn get_info(state: &AppState, caller: &AuthUser, user_id: Uuid) -> Result<UserInfo, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    require_user(state, user_id).await
}

pub async fn update_info(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    payload: UserInfoPayload,
) -> Result<UserInfo, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    let mut user = require_user(state, user_id).await?;

    if let Some(plan_id) = &payload.plan_id {
        if state.store.get_plan(plan_id).await?.is_none() {
            return Err(ApiError::bad_request(format!("Unknown plan '{}'", plan_id)));
        }
    }
    user.name = payload.name.trim().to_string();
    user.plan_id = payload.plan_id;

    let saved = state.store.update_user(&user).await?;
    state.cache.invalidate(keys::PEOPLE).await;
    Ok(saved)
}

// Invoice

pub async fn get_invoice(state: &AppState, caller: &AuthUser, user_id: Uuid) -> Result<InvoiceData, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    state
        .store
        .get_invoice(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice data not found"))
}

pub async fn upsert_invoice(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    payload: InvoicePayload,
) -> Result<InvoiceData, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    let user = require_user(state, user_id).await?;
    if !user.plan_type.requires_invoice() {
        return Err(ApiError::bad_request("Free accounts have no invoice data"));
    }

    let invoice = InvoiceData {
        user_id,
        company_name: payload.company_name.trim().to_string(),
        address: payload.address.trim().to_string(),
        zip_code: payload.zip_code.trim().to_string(),
        city: payload.city.trim().to_string(),
        country: payload.country.trim().to_string(),
        vat_number: payload.vat_number.map(|v| v.trim().to_string()),
    };
    Ok(state.store.upsert_invoice(&invoice).await?)
}

// Map location

pub async fn get_map_info(state: &AppState, caller: &AuthUser, user_id: Uuid) -> Result<MapInfo, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    state
        .store
        .get_map_info_for_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Map info not found"))
}

/// Insert or replace the user's single map point, keeping its id so routes
/// that pass through it stay valid.
pub async fn upsert_map_info(
    state: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    payload: MapInfoPayload,
) -> Result<MapInfo, ApiError> {
    caller.ensure_can_act_for(user_id)?;
    require_user(state, user_id).await?;
    let existing = state.store.get_map_info_for_user(user_id).await?;

    let map_info = if payload.no_address {
        MapInfo {
            id: existing.map(|m| m.id).unwrap_or_else(Uuid::new_v4),
            user_id: Some(user_id),
            address: None,
            latitude: None,
            longitude: None,
            no_address: true,
        }
    } else {
        MapInfo {
            id: existing.map(|m| m.id).unwrap_or_else(Uuid::new_v4),
            user_id: Some(user_id),
            address: payload.address.map(|a| a.trim().to_string()),
            latitude: payload.latitude,
            longitude: payload.longitude,
            no_address: false,
        }
    };

    let saved = state.store.upsert_map_info(&map_info).await?;
    state.cache.invalidate(&[keys::MAP, keys::HUBS, keys::ROUTES]).await;
    Ok(saved)
}

// Public profile

#[derive(Debug, Clone, Serialize)]
pub struct ProfileHours {
    pub day: String,
    pub opens_at: String,
    pub closes_at: String,
}

/// Public page of an accepted participant, served at `/participants/:slug`.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantProfile {
    pub user_id: Uuid,
    pub slug: String,
    pub name: String,
    pub short_description: String,
    pub long_description: Option<String>,
    pub year: i32,
    pub display_number: Option<String>,
    pub image_path: Option<String>,
    pub is_curated: bool,
    pub hours: Vec<ProfileHours>,
    pub location: Option<Location>,
    pub events: Vec<Event>,
}

pub async fn public_profile(state: &AppState, slug: &str) -> Result<ParticipantProfile, ApiError> {
    let details = state
        .store
        .find_participant_by_slug(slug)
        .await?
        .filter(|d| d.status == ParticipantStatus::Accepted)
        .ok_or_else(|| ApiError::not_found("Participant not found"))?;
    let user = require_user(state, details.user_id).await?;

    let hours = state
        .store
        .get_hours(details.user_id)
        .await?
        .into_iter()
        .map(|h| ProfileHours {
            day: h.day,
            opens_at: h.opens_at,
            closes_at: h.closes_at,
        })
        .collect();
    let location = state
        .store
        .get_map_info_for_user(details.user_id)
        .await?
        .and_then(|m| Location::from_map_info(&m));
    let events = state.store.list_events(Some(details.user_id)).await?;

    Ok(ParticipantProfile {
        user_id: details.user_id,
        slug: details.slug,
        name: user.name,
        short_description: details.short_description,
        long_description: details.long_description,
        year: details.year,
        display_number: details.display_number,
        image_path: details.image_path,
        is_curated: details.is_sticky,
        hours,
        location,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use crate::services::testing;
    use serde_json::json;

    fn details_payload(body: serde_json::Value) -> ParticipantDetailsPayload {
        parse(body).unwrap()
    }

    #[tokio::test]
    async fn owners_cannot_touch_other_participants() {
        let state = testing::state();
        let a = testing::register(&state, PlanType::Participant, "Studio A").await;
        let b = testing::register(&state, PlanType::Participant, "Studio B").await;

        let err = get_details(&state, &testing::as_user(a), b).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(get_details(&state, &testing::admin(), b).await.is_ok());
    }

    #[tokio::test]
    async fn image_must_come_from_the_owner_folder() {
        let state = testing::state();
        let a = testing::register(&state, PlanType::Participant, "Studio A").await;
        let b = testing::register(&state, PlanType::Participant, "Studio B").await;
        let theirs = format!("{}/photo.png", storage::user_folder(b));
        let mine = format!("{}/photo.png", storage::user_folder(a));
        let replacement = format!("{}/photo-2.png", storage::user_folder(a));
        for path in [&theirs, &mine, &replacement] {
            state.storage.put(path, b"png").await.unwrap();
        }

        let body = |path: &str| details_payload(json!({ "short_description": "Studio", "image_path": path }));
        let err = update_details(&state, &testing::as_user(a), a, body(&theirs)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        update_details(&state, &testing::as_user(a), a, body(&mine)).await.unwrap();
        update_details(&state, &testing::as_user(a), a, body(&replacement)).await.unwrap();
        assert!(state.storage.get(&mine).await.is_err());
        assert!(state.storage.get(&theirs).await.is_ok());
    }

    #[tokio::test]
    async fn staff_fields_are_ignored_for_owners() {
        let state = testing::state();
        let id = testing::register(&state, PlanType::Participant, "Studio").await;
        let body = json!({ "short_description": "New", "is_sticky": true, "status": "accepted" });

        let saved = update_details(&state, &testing::as_user(id), id, details_payload(body.clone()))
            .await
            .unwrap();
        assert!(!saved.is_sticky);
        assert_eq!(saved.status, ParticipantStatus::Pending);
        assert_eq!(saved.short_description, "New");

        let saved = update_details(&state, &testing::admin(), id, details_payload(body)).await.unwrap();
        assert!(saved.is_sticky);
        assert_eq!(saved.status, ParticipantStatus::Accepted);
    }

    #[tokio::test]
    async fn create_details_requires_participant_plan() {
        let state = testing::state();
        let member = testing::register(&state, PlanType::Member, "Member").await;
        let err = create_details(
            &state,
            &testing::as_user(member),
            member,
            details_payload(json!({ "short_description": "x" })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn hours_keep_submitted_order() {
        let state = testing::state();
        let id = testing::register(&state, PlanType::Participant, "Studio").await;
        let payload: HoursPayload = parse(json!({ "hours": [
            { "day": "Sunday", "opens_at": "12:00", "closes_at": "17:00" },
            { "day": "saturday", "opens_at": "10:00", "closes_at": "18:00" }
        ]}))
        .unwrap();

        replace_hours(&state, &testing::as_user(id), id, payload).await.unwrap();
        let hours = get_hours(&state, &testing::as_user(id), id).await.unwrap();
        let days: Vec<&str> = hours.iter().map(|h| h.day.as_str()).collect();
        assert_eq!(days, ["sunday", "saturday"]);
    }

    #[tokio::test]
    async fn map_info_upsert_keeps_id() {
        let state = testing::state();
        let id = testing::register(&state, PlanType::Participant, "Studio").await;
        let caller = testing::as_user(id);

        let first: MapInfoPayload = parse(json!({ "latitude": 52.37, "longitude": 4.89 })).unwrap();
        let created = upsert_map_info(&state, &caller, id, first).await.unwrap();
        let second: MapInfoPayload = parse(json!({ "no_address": true })).unwrap();
        let replaced = upsert_map_info(&state, &caller, id, second).await.unwrap();

        assert_eq!(created.id, replaced.id);
        assert!(replaced.no_address);
        assert_eq!(replaced.coordinates(), None);
    }

    #[tokio::test]
    async fn free_users_have_no_invoice() {
        let state = testing::state();
        let id = testing::register(&state, PlanType::Free, "Visitor").await;
        let payload: InvoicePayload = parse(json!({
            "company_name": "ACME", "address": "1 St", "zip_code": "1", "city": "X", "country": "BE"
        }))
        .unwrap();
        let err = upsert_invoice(&state, &testing::as_user(id), id, payload).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn profile_is_public_once_accepted() {
        let state = testing::state();
        let id = testing::register(&state, PlanType::Participant, "Glass Works").await;
        let slug = state.store.get_participant(id).await.unwrap().unwrap().slug;
        assert_eq!(public_profile(&state, &slug).await.unwrap_err().status_code(), 404);

        let body = json!({ "short_description": "Glass", "status": "accepted" });
        update_details(&state, &testing::admin(), id, details_payload(body)).await.unwrap();
        let profile = public_profile(&state, &slug).await.unwrap();
        assert_eq!(profile.name, "Glass Works");
        assert!(profile.location.is_none());
    }
}
