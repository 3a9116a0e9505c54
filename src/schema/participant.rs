use serde::Deserialize;

use super::{
    display_number, latitude, longitude, max_len, optional_nonblank, required, storage_path, time_of_day, year,
    Validate, ValidationError,
};
use crate::database::models::ParticipantStatus;

pub const MAX_HOUR_SLOTS: usize = 14;

/// Participant profile body. `is_sticky` and `status` are honoured for staff only.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantDetailsPayload {
    #[serde(default)]
    pub slug: Option<String>,
    pub short_description: String,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub display_number: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub is_sticky: Option<bool>,
    #[serde(default)]
    pub status: Option<ParticipantStatus>,
}

impl Validate for ParticipantDetailsPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(slug) = &self.slug {
            let ok = !slug.is_empty()
                && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if !ok {
                return Err(ValidationError::new("slug", "must use lowercase letters, digits and dashes"));
            }
        }
        required("short_description", &self.short_description)?;
        max_len("short_description", &self.short_description, 280)?;
        optional_nonblank("long_description", &self.long_description)?;
        if let Some(y) = self.year {
            year("year", y)?;
        }
        if let Some(n) = &self.display_number {
            display_number("display_number", n)?;
        }
        if let Some(path) = &self.image_path {
            storage_path("image_path", path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourSlot {
    pub day: String,
    pub opens_at: String,
    pub closes_at: String,
}

/// Full replacement of a participant's opening hours.
#[derive(Debug, Clone, Deserialize)]
pub struct HoursPayload {
    pub hours: Vec<HourSlot>,
}

impl Validate for HoursPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.hours.len() > MAX_HOUR_SLOTS {
            return Err(ValidationError::new("hours", format!("at most {} slots", MAX_HOUR_SLOTS)));
        }
        for (i, slot) in self.hours.iter().enumerate() {
            required(&format!("hours[{}].day", i), &slot.day)?;
            time_of_day(&format!("hours[{}].opens_at", i), &slot.opens_at)?;
            time_of_day(&format!("hours[{}].closes_at", i), &slot.closes_at)?;
            if slot.closes_at <= slot.opens_at {
                return Err(ValidationError::new(
                    format!("hours[{}].closes_at", i),
                    "must be after opens_at",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoPayload {
    pub name: String,
    #[serde(default)]
    pub plan_id: Option<String>,
}

impl Validate for UserInfoPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        max_len("name", &self.name, 120)?;
        optional_nonblank("plan_id", &self.plan_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoicePayload {
    pub company_name: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub vat_number: Option<String>,
}

impl Validate for InvoicePayload {
    fn validate(&self) -> Result<(), ValidationError> {
        required("company_name", &self.company_name)?;
        required("address", &self.address)?;
        required("zip_code", &self.zip_code)?;
        required("city", &self.city)?;
        required("country", &self.country)?;
        optional_nonblank("vat_number", &self.vat_number)
    }
}

/// A map location: an address, a coordinate pair, or an explicit `no_address`.
#[derive(Debug, Clone, Deserialize)]
pub struct MapInfoPayload {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub no_address: bool,
}

impl Validate for MapInfoPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(lat) = self.latitude {
            latitude("latitude", lat)?;
        }
        if let Some(lng) = self.longitude {
            longitude("longitude", lng)?;
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            let missing = if self.latitude.is_none() { "latitude" } else { "longitude" };
            return Err(ValidationError::new(missing, "latitude and longitude must be given together"));
        }
        optional_nonblank("address", &self.address)?;
        if !self.no_address && self.address.is_none() && self.latitude.is_none() {
            return Err(ValidationError::new("address", "is required unless no_address is set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use serde_json::json;

    #[test]
    fn hours_must_close_after_opening() {
        let err = parse::<HoursPayload>(json!({
            "hours": [
                { "day": "saturday", "opens_at": "10:00", "closes_at": "18:00" },
                { "day": "sunday", "opens_at": "12:00", "closes_at": "11:00" }
            ]
        }))
        .unwrap_err();
        assert_eq!(err.field, "hours[1].closes_at");
    }

    #[test]
    fn map_info_accepts_explicit_no_address() {
        assert!(parse::<MapInfoPayload>(json!({ "no_address": true })).is_ok());
        assert!(parse::<MapInfoPayload>(json!({})).is_err());
        assert!(parse::<MapInfoPayload>(json!({ "latitude": 91.0, "longitude": 0.0 })).is_err());
    }

    #[test]
    fn slug_shape() {
        let body = json!({ "slug": "Studio North", "short_description": "x" });
        assert_eq!(parse::<ParticipantDetailsPayload>(body).unwrap_err().field, "slug");
    }
}
