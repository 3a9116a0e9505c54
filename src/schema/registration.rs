use serde::Deserialize;

use super::{display_number, email, latitude, longitude, max_len, optional_nonblank, password, required, year};
use super::{Validate, ValidationError};
use crate::database::models::PlanType;

/// Sign-up body, discriminated by `plan_type`. Each variant carries exactly
/// the fields its plan needs.
///
/// Expected Input:
/// ```json
/// {
///   "plan_type": "participant",
///   "email": "studio@example.org",
///   "password": "correct horse",
///   "name": "Studio North",
///   "invoice_company_name": "Studio North Ltd",
///   "invoice_address": "1 Canal St",
///   "invoice_zip_code": "1011",
///   "invoice_city": "Amsterdam",
///   "invoice_country": "NL",
///   "short_description": "Furniture and lighting",
///   "no_address": true
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "plan_type", rename_all = "lowercase")]
pub enum RegistrationPayload {
    Free {
        #[serde(flatten)]
        account: AccountFields,
    },
    Member {
        #[serde(flatten)]
        account: AccountFields,
        #[serde(flatten)]
        invoice: InvoiceFields,
    },
    Participant(ParticipantRegistration),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountFields {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub plan_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceFields {
    pub invoice_company_name: String,
    pub invoice_address: String,
    pub invoice_zip_code: String,
    pub invoice_city: String,
    pub invoice_country: String,
    #[serde(default)]
    pub invoice_vat_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationFields {
    #[serde(default)]
    pub no_address: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantRegistration {
    #[serde(flatten)]
    pub account: AccountFields,
    #[serde(flatten)]
    pub invoice: InvoiceFields,
    #[serde(flatten)]
    pub location: LocationFields,
    #[serde(default)]
    pub slug: Option<String>,
    pub short_description: String,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub display_number: Option<String>,
}

impl RegistrationPayload {
    pub fn plan_type(&self) -> PlanType {
        match self {
            RegistrationPayload::Free { .. } => PlanType::Free,
            RegistrationPayload::Member { .. } => PlanType::Member,
            RegistrationPayload::Participant(_) => PlanType::Participant,
        }
    }

    pub fn account(&self) -> &AccountFields {
        match self {
            RegistrationPayload::Free { account } | RegistrationPayload::Member { account, .. } => account,
            RegistrationPayload::Participant(p) => &p.account,
        }
    }

    pub fn invoice(&self) -> Option<&InvoiceFields> {
        match self {
            RegistrationPayload::Free { .. } => None,
            RegistrationPayload::Member { invoice, .. } => Some(invoice),
            RegistrationPayload::Participant(p) => Some(&p.invoice),
        }
    }
}

impl Validate for AccountFields {
    fn validate(&self) -> Result<(), ValidationError> {
        email("email", &self.email)?;
        password("password", &self.password)?;
        required("name", &self.name)?;
        max_len("name", &self.name, 120)?;
        optional_nonblank("plan_id", &self.plan_id)
    }
}

impl Validate for InvoiceFields {
    fn validate(&self) -> Result<(), ValidationError> {
        required("invoice_company_name", &self.invoice_company_name)?;
        required("invoice_address", &self.invoice_address)?;
        required("invoice_zip_code", &self.invoice_zip_code)?;
        required("invoice_city", &self.invoice_city)?;
        required("invoice_country", &self.invoice_country)?;
        optional_nonblank("invoice_vat_number", &self.invoice_vat_number)
    }
}

impl Validate for LocationFields {
    /// Without `no_address`, a location needs an address or a full coordinate pair.
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
        if self.no_address {
            return Ok(());
        }
        let has_address = self.address.as_deref().is_some_and(|a| !a.trim().is_empty());
        if !has_address && self.latitude.is_none() {
            return Err(ValidationError::new("address", "is required unless no_address is set"));
        }
        Ok(())
    }
}

impl Validate for ParticipantRegistration {
    fn validate(&self) -> Result<(), ValidationError> {
        self.account.validate()?;
        self.invoice.validate()?;
        optional_nonblank("slug", &self.slug)?;
        required("short_description", &self.short_description)?;
        max_len("short_description", &self.short_description, 280)?;
        if let Some(y) = self.year {
            year("year", y)?;
        }
        if let Some(n) = &self.display_number {
            display_number("display_number", n)?;
        }
        self.location.validate()
    }
}

impl Validate for RegistrationPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            RegistrationPayload::Free { account } => account.validate(),
            RegistrationPayload::Member { account, invoice } => {
                account.validate()?;
                invoice.validate()
            }
            RegistrationPayload::Participant(p) => p.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use serde_json::json;

    fn member() -> serde_json::Value {
        json!({
            "plan_type": "member",
            "email": "m@example.org",
            "password": "longenough",
            "name": "Member",
            "invoice_company_name": "ACME",
            "invoice_address": "Street 1",
            "invoice_zip_code": "1000",
            "invoice_city": "Brussels",
            "invoice_country": "BE"
        })
    }

    #[test]
    fn free_needs_only_account_fields() {
        let payload: RegistrationPayload = parse(json!({
            "plan_type": "free",
            "email": "f@example.org",
            "password": "longenough",
            "name": "Free"
        }))
        .unwrap();
        assert_eq!(payload.plan_type(), PlanType::Free);
        assert!(payload.invoice().is_none());
    }

    #[test]
    fn member_without_company_name_names_the_field() {
        let mut body = member();
        body.as_object_mut().unwrap().remove("invoice_company_name");
        let err = parse::<RegistrationPayload>(body).unwrap_err();
        assert_eq!(err.field, "invoice_company_name");

        let mut body = member();
        body["invoice_company_name"] = json!("   ");
        let err = parse::<RegistrationPayload>(body).unwrap_err();
        assert_eq!(err.field, "invoice_company_name");
    }

    #[test]
    fn unknown_plan_type_is_rejected() {
        let mut body = member();
        body["plan_type"] = json!("gold");
        assert!(parse::<RegistrationPayload>(body).is_err());
    }

    #[test]
    fn participant_needs_location_unless_no_address() {
        let mut body = member();
        body["plan_type"] = json!("participant");
        body["short_description"] = json!("Ceramics");
        let err = parse::<RegistrationPayload>(body.clone()).unwrap_err();
        assert_eq!(err.field, "address");

        body["no_address"] = json!(true);
        assert!(parse::<RegistrationPayload>(body.clone()).is_ok());

        body["no_address"] = json!(false);
        body["latitude"] = json!(52.37);
        let err = parse::<RegistrationPayload>(body.clone()).unwrap_err();
        assert_eq!(err.field, "longitude");

        body["longitude"] = json!(4.89);
        assert!(parse::<RegistrationPayload>(body).is_ok());
    }

    #[test]
    fn short_password_fails() {
        let mut body = member();
        body["password"] = json!("short");
        assert_eq!(parse::<RegistrationPayload>(body).unwrap_err().field, "password");
    }
}
