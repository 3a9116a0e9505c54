// Request schemas: shape (serde) plus field rules (Validate).
//
// Every write endpoint deserialises into one of these payloads and runs
// `validate()` before touching a service. The first violated field wins.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::ApiError;

pub mod content;
pub mod event;
pub mod hub;
pub mod participant;
pub mod plan;
pub mod registration;
pub mod requests;
pub mod route;

pub use content::{ContentItemPayload, SectionKind, SectionPayload};
pub use event::EventPayload;
pub use hub::HubPayload;
pub use participant::{HourSlot, HoursPayload, InvoicePayload, MapInfoPayload, ParticipantDetailsPayload, UserInfoPayload};
pub use plan::PlanPayload;
pub use registration::{AccountFields, InvoiceFields, LocationFields, ParticipantRegistration, RegistrationPayload};
pub use requests::{DeleteUsersPayload, DisplayNumberCheck, EntityType, LoginPayload};
pub use route::{RouteDotPayload, RoutePayload};

/// First rule a payload violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Recover the offending field from a serde error message
    /// (`missing field `x``, `unknown field `y``), falling back to `body`.
    pub fn from_serde(err: &serde_json::Error) -> Self {
        let text = err.to_string();
        let field = text
            .split('`')
            .nth(1)
            .filter(|_| text.starts_with("missing field") || text.starts_with("unknown field"))
            .unwrap_or("body");
        let message = text.split(" at line").next().unwrap_or(&text).to_string();
        Self::new(field, message)
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Deserialise a JSON value into `T` and run its rules.
pub fn parse<T: DeserializeOwned + Validate>(value: Value) -> Result<T, ValidationError> {
    let payload: T = serde_json::from_value(value).map_err(|e| ValidationError::from_serde(&e))?;
    payload.validate()?;
    Ok(payload)
}

/// JSON body extractor that rejects invalid payloads with a 400 `{error, details}`.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::validation(
                    "Invalid JSON body",
                    serde_json::json!({ "field": "body", "message": rejection.body_text() }),
                )
            })?;
        Ok(ValidJson(parse(value)?))
    }
}

// Field rules

pub(crate) fn required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

pub(crate) fn optional_nonblank(field: &str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) => required(field, v),
        None => Ok(()),
    }
}

pub(crate) fn max_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(field, format!("must be at most {} characters", max)));
    }
    Ok(())
}

pub(crate) fn email(field: &str, value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new(field, "must be a valid email address");
    let (local, domain) = value.trim().split_once('@').ok_or_else(invalid)?;
    let domain_ok = domain
        .split_once('.')
        .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        .unwrap_or(false);
    if local.is_empty() || !domain_ok || value.contains(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}

pub(crate) fn password(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < 8 {
        return Err(ValidationError::new(field, "must be at least 8 characters"));
    }
    Ok(())
}

pub(crate) fn http_url(field: &str, value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value.trim()) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(()),
        _ => Err(ValidationError::new(field, "must be an http(s) URL")),
    }
}

pub(crate) fn latitude(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&value) {
        return Err(ValidationError::new(field, "must be between -90 and 90"));
    }
    Ok(())
}

pub(crate) fn longitude(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(-180.0..=180.0).contains(&value) {
        return Err(ValidationError::new(field, "must be between -180 and 180"));
    }
    Ok(())
}

pub(crate) fn year(field: &str, value: i32) -> Result<(), ValidationError> {
    if !(2000..=2100).contains(&value) {
        return Err(ValidationError::new(field, "must be between 2000 and 2100"));
    }
    Ok(())
}

pub(crate) fn display_number(field: &str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 || len > 8 || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(field, "must be 1-8 letters or digits"));
    }
    Ok(())
}

/// `HH:MM`, 24-hour clock.
pub(crate) fn time_of_day(field: &str, value: &str) -> Result<(), ValidationError> {
    let valid = value
        .split_once(':')
        .filter(|(h, m)| h.len() == 2 && m.len() == 2)
        .and_then(|(h, m)| Some((h.parse::<u8>().ok()?, m.parse::<u8>().ok()?)))
        .map(|(h, m)| h < 24 && m < 60)
        .unwrap_or(false);
    if !valid {
        return Err(ValidationError::new(field, "must be a time in HH:MM format"));
    }
    Ok(())
}

/// Stored file references are relative paths inside the storage root.
pub(crate) fn storage_path(field: &str, value: &str) -> Result<(), ValidationError> {
    if crate::storage::FileStorage::is_safe_path(value) {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be a relative storage path"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rule() {
        assert!(email("email", "ada@example.org").is_ok());
        assert!(email("email", "ada@example").is_err());
        assert!(email("email", "@example.org").is_err());
        assert!(email("email", "ada example@x.org").is_err());
    }

    #[test]
    fn display_number_rule() {
        assert!(display_number("display_number", "3B").is_ok());
        assert!(display_number("display_number", "").is_err());
        assert!(display_number("display_number", "3-B").is_err());
        assert!(display_number("display_number", "123456789").is_err());
    }

    #[test]
    fn time_rule() {
        assert!(time_of_day("t", "09:30").is_ok());
        assert!(time_of_day("t", "24:00").is_err());
        assert!(time_of_day("t", "9:30").is_err());
    }

    #[test]
    fn serde_errors_name_the_missing_field() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Probe {
            name: String,
        }
        let err = serde_json::from_value::<Probe>(serde_json::json!({})).unwrap_err();
        let v = ValidationError::from_serde(&err);
        assert_eq!(v.field, "name");
    }
}
