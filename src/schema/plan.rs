use rust_decimal::Decimal;
use serde::Deserialize;

use super::{max_len, required, Validate, ValidationError};

/// Body for `POST /plans` and `PUT /plans?plan=<id>`. The id itself is never
/// taken from the body.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanPayload {
    pub label: String,
    pub price: Decimal,
    pub currency: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_true() -> bool {
    true
}

impl Validate for PlanPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        required("label", &self.label)?;
        max_len("label", &self.label, 80)?;
        if self.price.is_sign_negative() {
            return Err(ValidationError::new("price", "must not be negative"));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::new("currency", "must be a 3-letter ISO code"));
        }
        for (i, feature) in self.features.iter().enumerate() {
            required(&format!("features[{}]", i), feature)?;
        }
        Ok(())
    }
}
