use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Event;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::schema::EventPayload;
use crate::storage;

pub async fn list(state: &AppState, organizer: Option<Uuid>) -> Result<Vec<Event>, ApiError> {
    Ok(state.store.list_events(organizer).await?)
}

pub async fn get(state: &AppState, id: Uuid) -> Result<Event, ApiError> {
    state
        .store
        .get_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

/// The caller organises the event unless staff file it for someone else.
pub async fn create(state: &AppState, caller: &AuthUser, payload: EventPayload) -> Result<Event, ApiError> {
    let organizer_id = match payload.organizer_id {
        Some(id) if id != caller.user_id && !caller.is_staff() => {
            return Err(ApiError::forbidden("Only staff may create events for another organizer"));
        }
        Some(id) => id,
        None => caller.user_id,
    };
    check_people(state, organizer_id, &payload.co_organizers).await?;
    check_image(organizer_id, &payload)?;

    let event = to_event(Uuid::new_v4(), organizer_id, &payload);
    let saved = state.store.insert_event(&event).await?;
    info!("Created event {} for organizer {}", saved.id, organizer_id);
    Ok(saved)
}

/// Organiser, co-organisers and staff may edit. The organiser only changes
/// when staff ask for it.
pub async fn update(state: &AppState, caller: &AuthUser, id: Uuid, payload: EventPayload) -> Result<Event, ApiError> {
    let current = get(state, id).await?;
    if !current.is_organized_by(caller.user_id) && !caller.is_staff() {
        return Err(ApiError::forbidden("You may only edit events you organise"));
    }

    let organizer_id = match payload.organizer_id {
        Some(new) if new != current.organizer_id && !caller.is_staff() => {
            return Err(ApiError::forbidden("Only staff may change the organizer"));
        }
        Some(new) => new,
        None => current.organizer_id,
    };
    check_people(state, organizer_id, &payload.co_organizers).await?;
    check_image(organizer_id, &payload)?;

    let event = Event {
        created_at: current.created_at,
        ..to_event(id, organizer_id, &payload)
    };
    let saved = state.store.update_event(&event).await?;

    if current.image_path.is_some() && current.image_path != saved.image_path {
        let stale = storage::owned_paths(current.image_path, &storage::user_folder(current.organizer_id));
        state.storage.delete_best_effort(&stale).await;
    }
    info!("Updated event {}", id);
    Ok(saved)
}

/// Only the organiser or staff may delete; co-organisers may not.
pub async fn delete(state: &AppState, caller: &AuthUser, id: Uuid) -> Result<(), ApiError> {
    let current = get(state, id).await?;
    if current.organizer_id != caller.user_id && !caller.is_staff() {
        return Err(ApiError::forbidden("Only the organizer may delete this event"));
    }
    state.store.delete_event(id).await?;
    let stale = storage::owned_paths(current.image_path, &storage::user_folder(current.organizer_id));
    state.storage.delete_best_effort(&stale).await;
    info!("Deleted event {}", id);
    Ok(())
}

async fn check_people(state: &AppState, organizer_id: Uuid, co_organizers: &[Uuid]) -> Result<(), ApiError> {
    if co_organizers.contains(&organizer_id) {
        return Err(ApiError::bad_request("The organizer cannot also be a co-organizer"));
    }
    let mut ids = co_organizers.to_vec();
    ids.push(organizer_id);
    let found = state.store.users_by_ids(&ids).await?;
    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|u| u.id == **id)) {
        return Err(ApiError::bad_request(format!("Unknown user {}", missing)));
    }
    Ok(())
}

/// Event images live in the organizer's folder.
fn check_image(organizer_id: Uuid, payload: &EventPayload) -> Result<(), ApiError> {
    if let Some(path) = &payload.image_path {
        storage::check_within(path, &storage::user_folder(organizer_id))?;
    }
    Ok(())
}

fn to_event(id: Uuid, organizer_id: Uuid, payload: &EventPayload) -> Event {
    let (rsvp_message, rsvp_link) = payload.rsvp_fields();
    Event {
        id,
        organizer_id,
        co_organizers: payload.co_organizers.clone(),
        title: payload.title.trim().to_string(),
        description: payload.description.clone(),
        day: payload.day.trim().to_string(),
        event_type: payload.event_type.trim().to_string(),
        start_time: payload.start_time.clone(),
        end_time: payload.end_time.clone(),
        rsvp: payload.rsvp,
        rsvp_message,
        rsvp_link,
        image_path: payload.image_path.clone(),
        created_at: Utc::now(),
    }
}
