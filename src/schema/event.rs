use serde::Deserialize;
use uuid::Uuid;

use super::{http_url, max_len, optional_nonblank, required, storage_path, time_of_day, Validate, ValidationError};

pub const MAX_CO_ORGANIZERS: usize = 4;

/// Event body. RSVP message and link are required together when `rsvp` is set
/// and ignored otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub day: String,
    pub event_type: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub rsvp: bool,
    #[serde(default)]
    pub rsvp_message: Option<String>,
    #[serde(default)]
    pub rsvp_link: Option<String>,
    #[serde(default)]
    pub co_organizers: Vec<Uuid>,
    #[serde(default)]
    pub image_path: Option<String>,
    /// Staff may file an event on someone else's behalf.
    #[serde(default)]
    pub organizer_id: Option<Uuid>,
}

impl Validate for EventPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        required("title", &self.title)?;
        max_len("title", &self.title, 160)?;
        required("day", &self.day)?;
        required("event_type", &self.event_type)?;

        if let Some(start) = &self.start_time {
            time_of_day("start_time", start)?;
        }
        if let Some(end) = &self.end_time {
            time_of_day("end_time", end)?;
            if let Some(start) = &self.start_time {
                // HH:MM compares lexicographically
                if end <= start {
                    return Err(ValidationError::new("end_time", "must be after start_time"));
                }
            }
        }

        if self.rsvp {
            match self.rsvp_message.as_deref().map(str::trim) {
                Some(m) if !m.is_empty() => {}
                _ => return Err(ValidationError::new("rsvp_message", "is required when rsvp is true")),
            }
            match self.rsvp_link.as_deref().map(str::trim) {
                Some(l) if !l.is_empty() => http_url("rsvp_link", l)?,
                _ => return Err(ValidationError::new("rsvp_link", "is required when rsvp is true")),
            }
        }

        if self.co_organizers.len() > MAX_CO_ORGANIZERS {
            return Err(ValidationError::new(
                "co_organizers",
                format!("at most {} co-organizers", MAX_CO_ORGANIZERS),
            ));
        }
        let mut seen = self.co_organizers.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.co_organizers.len() {
            return Err(ValidationError::new("co_organizers", "must not repeat a user"));
        }

        optional_nonblank("description", &self.description)?;
        if let Some(path) = &self.image_path {
            storage_path("image_path", path)?;
        }
        Ok(())
    }
}

impl EventPayload {
    /// RSVP fields as stored: dropped entirely when RSVP is off.
    pub fn rsvp_fields(&self) -> (Option<String>, Option<String>) {
        if self.rsvp {
            (
                self.rsvp_message.as_ref().map(|s| s.trim().to_string()),
                self.rsvp_link.as_ref().map(|s| s.trim().to_string()),
            )
        } else {
            (None, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use serde_json::{json, Value};

    fn base() -> Value {
        json!({ "title": "Open studio", "day": "2024-09-14", "event_type": "talk" })
    }

    #[test]
    fn rsvp_requires_message_and_link() {
        let mut body = base();
        body["rsvp"] = json!(true);
        body["rsvp_link"] = json!("https://tickets.example.org");
        assert_eq!(parse::<EventPayload>(body.clone()).unwrap_err().field, "rsvp_message");

        body["rsvp_message"] = json!("");
        assert_eq!(parse::<EventPayload>(body.clone()).unwrap_err().field, "rsvp_message");

        body["rsvp_message"] = json!("Book a seat");
        body["rsvp_link"] = json!("");
        assert_eq!(parse::<EventPayload>(body.clone()).unwrap_err().field, "rsvp_link");

        body["rsvp_link"] = json!("https://tickets.example.org");
        assert!(parse::<EventPayload>(body).is_ok());
    }

    #[test]
    fn rsvp_off_never_requires_fields() {
        let mut body = base();
        body["rsvp"] = json!(false);
        body["rsvp_link"] = json!("");
        let event = parse::<EventPayload>(body).unwrap();
        assert_eq!(event.rsvp_fields(), (None, None));
    }

    #[test]
    fn at_most_four_co_organizers() {
        let mut body = base();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        body["co_organizers"] = json!(ids);
        assert_eq!(parse::<EventPayload>(body.clone()).unwrap_err().field, "co_organizers");

        body["co_organizers"] = json!(&ids[..4]);
        assert!(parse::<EventPayload>(body).is_ok());
    }

    #[test]
    fn end_must_follow_start() {
        let mut body = base();
        body["start_time"] = json!("18:00");
        body["end_time"] = json!("17:00");
        assert_eq!(parse::<EventPayload>(body).unwrap_err().field, "end_time");
    }
}
