// services - business operations behind the HTTP handlers and the CLI.
//
// Services take the shared `AppState`, talk to the store through the `Store`
// trait, and return `ApiError` so handlers can hand results straight back.

pub mod auth;
pub mod content;
pub mod display_numbers;
pub mod events;
pub mod hubs;
pub mod participants;
pub mod plans;
pub mod registration;
pub mod routes;
pub mod slugs;
pub mod users;
pub mod views;

#[cfg(test)]
pub(crate) mod testing {
    use uuid::Uuid;

    use crate::app::AppState;
    use crate::config::AppConfig;
    use crate::database::models::{PlanType, UserRole};
    use crate::middleware::AuthUser;
    use crate::schema::{parse, RegistrationPayload};

    pub fn state() -> AppState {
        let mut config = AppConfig::development();
        config.storage.root = std::env::temp_dir()
            .join(format!("glue-test-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();
        AppState::in_memory(config)
    }

    pub fn admin() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Admin,
        }
    }

    pub fn as_user(id: Uuid) -> AuthUser {
        AuthUser {
            user_id: id,
            role: UserRole::User,
        }
    }

    /// Register a user of the given plan and return its id.
    pub async fn register(state: &AppState, plan_type: PlanType, name: &str) -> Uuid {
        let email = format!("{}@example.org", Uuid::new_v4().simple());
        let mut body = serde_json::json!({
            "plan_type": plan_type.as_str(),
            "email": email,
            "password": "longenough",
            "name": name,
            "invoice_company_name": "ACME",
            "invoice_address": "Street 1",
            "invoice_zip_code": "1000",
            "invoice_city": "Brussels",
            "invoice_country": "BE",
            "short_description": "Design studio",
            "no_address": true
        });
        if plan_type != PlanType::Participant {
            body.as_object_mut().unwrap().remove("short_description");
        }
        let payload: RegistrationPayload = parse(body).unwrap();
        super::registration::register(state, payload).await.unwrap().id
    }
}
