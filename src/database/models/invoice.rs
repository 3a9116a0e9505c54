use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Billing address, one per member/participant user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceData {
    pub user_id: Uuid,
    pub company_name: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub vat_number: Option<String>,
}
