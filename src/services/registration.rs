use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::slugs;
use crate::app::AppState;
use crate::auth::{hash_password, new_salt};
use crate::cache::keys;
use crate::database::models::*;
use crate::database::{constraints, DatabaseError, NewRegistration};
use crate::error::ApiError;
use crate::mail::{self, OutgoingEmail};
use crate::schema::{AccountFields, InvoiceFields, ParticipantRegistration, RegistrationPayload};

const WELCOME_TEMPLATE: &str = "welcome";

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub id: Uuid,
}

/// Create the identity, profile and plan-specific rows of a new user as one
/// atomic write. Slug collisions are retried with the next candidate.
pub async fn register(state: &AppState, payload: RegistrationPayload) -> Result<RegisteredUser, ApiError> {
    let plan_type = payload.plan_type();
    let account = payload.account();
    let email = account.email.trim().to_lowercase();

    if state.store.find_identity_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }
    if let Some(plan_id) = &account.plan_id {
        ensure_plan_exists(state, plan_id).await?;
    }

    let mut registration = base_registration(account, &email, plan_type, UserRole::User);
    let id = registration.user.id;
    registration.invoice = payload.invoice().map(|fields| invoice_row(id, fields));

    let participant = match &payload {
        RegistrationPayload::Participant(p) => Some(p),
        _ => None,
    };

    let slug = match participant {
        None => {
            state.store.insert_registration(&registration).await?;
            None
        }
        Some(p) => {
            registration.participant = Some(participant_row(id, p));
            registration.map_info = map_info_row(id, p);
            Some(insert_with_unique_slug(state, &mut registration, p).await?)
        }
    };

    info!("Registered {} user {}", plan_type, id);
    state.cache.invalidate(keys::PEOPLE).await;
    send_welcome(state, &email, account.name.trim(), slug.as_deref());

    Ok(RegisteredUser { id })
}

/// Staff accounts are created out of band (CLI), on the free plan.
pub async fn create_staff(
    state: &AppState,
    email: &str,
    name: &str,
    password: &str,
    role: UserRole,
) -> Result<RegisteredUser, ApiError> {
    let account = AccountFields {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
        plan_id: None,
    };
    crate::schema::Validate::validate(&account)?;

    let email = email.trim().to_lowercase();
    let registration = base_registration(&account, &email, PlanType::Free, role);
    let id = registration.user.id;
    state.store.insert_registration(&registration).await?;
    info!("Created {} account {}", role, id);
    state.cache.invalidate(keys::PEOPLE).await;
    Ok(RegisteredUser { id })
}

async fn ensure_plan_exists(state: &AppState, plan_id: &str) -> Result<(), ApiError> {
    match state.store.get_plan(plan_id).await? {
        Some(plan) if plan.is_active => Ok(()),
        _ => Err(ApiError::bad_request(format!("Unknown plan '{}'", plan_id))),
    }
}

async fn insert_with_unique_slug(
    state: &AppState,
    registration: &mut NewRegistration,
    payload: &ParticipantRegistration,
) -> Result<String, ApiError> {
    let base = slugs::base_for(payload.slug.as_deref(), &payload.account.name);

    for candidate in slugs::candidates(&base, state.config.registration.slug_attempts) {
        if let Some(details) = registration.participant.as_mut() {
            details.slug = candidate.clone();
        }
        match state.store.insert_registration(registration).await {
            Ok(()) => return Ok(candidate),
            Err(e) if e.is_conflict_on(constraints::PARTICIPANT_SLUG) => {
                tracing::debug!("Slug '{}' taken, trying next candidate", candidate);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(DatabaseError::conflict(constraints::PARTICIPANT_SLUG).into())
}

fn base_registration(account: &AccountFields, email: &str, plan_type: PlanType, role: UserRole) -> NewRegistration {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let salt = new_salt();

    NewRegistration {
        identity: AuthIdentity {
            id,
            email: email.to_string(),
            password_hash: hash_password(&salt, &account.password),
            salt,
            created_at: now,
        },
        user: UserInfo {
            id,
            email: email.to_string(),
            name: account.name.trim().to_string(),
            plan_id: account.plan_id.clone(),
            plan_type,
            role,
            created_at: now,
        },
        invoice: None,
        participant: None,
        map_info: None,
    }
}

fn invoice_row(user_id: Uuid, fields: &InvoiceFields) -> InvoiceData {
    InvoiceData {
        user_id,
        company_name: fields.invoice_company_name.trim().to_string(),
        address: fields.invoice_address.trim().to_string(),
        zip_code: fields.invoice_zip_code.trim().to_string(),
        city: fields.invoice_city.trim().to_string(),
        country: fields.invoice_country.trim().to_string(),
        vat_number: fields.invoice_vat_number.as_ref().map(|v| v.trim().to_string()),
    }
}

fn participant_row(user_id: Uuid, p: &ParticipantRegistration) -> ParticipantDetails {
    ParticipantDetails {
        user_id,
        slug: String::new(),
        short_description: p.short_description.trim().to_string(),
        long_description: p.long_description.clone(),
        is_sticky: false,
        status: ParticipantStatus::Pending,
        year: p.year.unwrap_or_else(|| Utc::now().year()),
        display_number: p.display_number.as_ref().map(|n| n.trim().to_string()),
        image_path: None,
    }
}

/// No map row at all when the participant has no address.
fn map_info_row(user_id: Uuid, p: &ParticipantRegistration) -> Option<MapInfo> {
    if p.location.no_address {
        return None;
    }
    Some(MapInfo {
        id: Uuid::new_v4(),
        user_id: Some(user_id),
        address: p.location.address.as_ref().map(|a| a.trim().to_string()),
        latitude: p.location.latitude,
        longitude: p.location.longitude,
        no_address: false,
    })
}

/// Fire-and-forget welcome email; failures only reach the log.
fn send_welcome(state: &AppState, email: &str, name: &str, slug: Option<&str>) {
    let state = state.clone();
    let to = email.to_string();
    let name = name.to_string();
    let slug = slug.unwrap_or_default().to_string();

    tokio::spawn(async move {
        let template = match welcome_template(&state).await {
            Ok(Some(t)) => t,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not load welcome template: {}", e);
                return;
            }
        };
        let vars = [("name", name.as_str()), ("email", to.as_str()), ("slug", slug.as_str())];
        let message = OutgoingEmail {
            from: state.config.email.from.clone(),
            to: to.clone(),
            subject: mail::render(&template.0, &vars),
            html: mail::render(&template.1, &vars),
        };
        if let Err(e) = state.mailer.send(&message).await {
            warn!("Welcome email to {} failed: {}", to, e);
        }
    });
}

/// `(subject, body)` of the welcome template, if one is configured.
async fn welcome_template(state: &AppState) -> Result<Option<(String, String)>, DatabaseError> {
    let items = state.store.list_items("email-templates").await?;
    Ok(items.into_iter().find_map(|item| {
        let text = |key: &str| item.data.get(key).and_then(Value::as_str).map(str::to_string);
        if text("key").as_deref() == Some(WELCOME_TEMPLATE) {
            Some((text("subject")?, text("body")?))
        } else {
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use crate::services::testing;
    use serde_json::json;

    fn participant_body(email: &str, slug: &str) -> Value {
        json!({
            "plan_type": "participant",
            "email": email,
            "password": "longenough",
            "name": "Studio North",
            "slug": slug,
            "invoice_company_name": "Studio North Ltd",
            "invoice_address": "1 Canal St",
            "invoice_zip_code": "1011",
            "invoice_city": "Amsterdam",
            "invoice_country": "NL",
            "short_description": "Furniture",
            "address": "1 Canal St, Amsterdam"
        })
    }

    #[tokio::test]
    async fn participant_writes_all_rows() {
        let state = testing::state();
        let payload = parse(participant_body("a@example.org", "studio")).unwrap();
        let id = register(&state, payload).await.unwrap().id;

        let store = &state.store;
        assert_eq!(store.get_user(id).await.unwrap().unwrap().plan_type, PlanType::Participant);
        assert!(store.get_invoice(id).await.unwrap().is_some());
        assert_eq!(store.get_participant(id).await.unwrap().unwrap().slug, "studio");
        assert!(store.get_map_info_for_user(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn free_writes_only_profile() {
        let state = testing::state();
        let id = testing::register(&state, PlanType::Free, "Visitor").await;

        assert!(state.store.get_user(id).await.unwrap().is_some());
        assert!(state.store.get_invoice(id).await.unwrap().is_none());
        assert!(state.store.get_participant(id).await.unwrap().is_none());
        assert!(state.store.get_map_info_for_user(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn colliding_slug_gets_next_candidate() {
        let state = testing::state();
        register(&state, parse(participant_body("a@example.org", "studio")).unwrap()).await.unwrap();
        let second = register(&state, parse(participant_body("b@example.org", "studio")).unwrap())
            .await
            .unwrap();
        let third = register(&state, parse(participant_body("c@example.org", "studio")).unwrap())
            .await
            .unwrap();

        let slug2 = state.store.get_participant(second.id).await.unwrap().unwrap().slug;
        let slug3 = state.store.get_participant(third.id).await.unwrap().unwrap().slug;
        assert_eq!(slug2, "studio-2");
        assert_eq!(slug3, "studio-3");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = testing::state();
        register(&state, parse(participant_body("a@example.org", "one")).unwrap()).await.unwrap();
        let err = register(&state, parse(participant_body("A@Example.org", "two")).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(state.store.find_participant_by_slug("two").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn taken_display_number_rolls_back_everything() {
        let state = testing::state();
        let mut first = participant_body("a@example.org", "one");
        first["display_number"] = json!("7A");
        register(&state, parse(first).unwrap()).await.unwrap();

        let mut second = participant_body("b@example.org", "two");
        second["display_number"] = json!("7A");
        let err = register(&state, parse(second).unwrap()).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(state.store.find_identity_by_email("b@example.org").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_plan_is_rejected_before_writing() {
        let state = testing::state();
        let mut body = participant_body("a@example.org", "one");
        body["plan_id"] = json!("planId-42");
        let err = register(&state, parse(body).unwrap()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(state.store.find_identity_by_email("a@example.org").await.unwrap().is_none());
    }
}
