use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single payment by one member on behalf of a subset of the group.
/// Expenses are immutable once recorded.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    #[schema(value_type = f64, example = 1500.0)]
    pub amount: Decimal,
    pub paid_by: String,
    pub split_between: Vec<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}
