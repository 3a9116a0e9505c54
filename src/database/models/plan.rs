use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub plan_id: String,
    pub label: String,
    pub price: Decimal,
    pub currency: String,
    pub features: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
}

pub const PLAN_ID_PREFIX: &str = "planId-";

impl Plan {
    /// `N` of a `planId-N` id.
    pub fn number(plan_id: &str) -> Option<u64> {
        plan_id.strip_prefix(PLAN_ID_PREFIX)?.parse().ok()
    }

    /// Listing order: ids without a numeric suffix first, then by number.
    pub fn list_order(a: &Plan, b: &Plan) -> Ordering {
        Plan::number(&a.plan_id)
            .cmp(&Plan::number(&b.plan_id))
            .then_with(|| a.plan_id.cmp(&b.plan_id))
    }
}
