use serde::Deserialize;
use uuid::Uuid;

use super::{max_len, optional_nonblank, required, Validate, ValidationError};
use crate::database::models::Zone;

#[derive(Debug, Clone, Deserialize)]
pub struct RouteDotPayload {
    pub map_info_id: Uuid,
    pub step: i32,
}

/// Route body: a named, zoned sequence of map points.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutePayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub zone: Zone,
    pub dots: Vec<RouteDotPayload>,
}

impl Validate for RoutePayload {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        max_len("name", &self.name, 120)?;
        optional_nonblank("description", &self.description)?;
        if self.dots.is_empty() {
            return Err(ValidationError::new("dots", "must contain at least one point"));
        }
        let mut steps: Vec<i32> = Vec::with_capacity(self.dots.len());
        for (i, dot) in self.dots.iter().enumerate() {
            if dot.step < 0 {
                return Err(ValidationError::new(format!("dots[{}].step", i), "must not be negative"));
            }
            if steps.contains(&dot.step) {
                return Err(ValidationError::new(format!("dots[{}].step", i), "steps must be unique"));
            }
            steps.push(dot.step);
        }
        Ok(())
    }
}
