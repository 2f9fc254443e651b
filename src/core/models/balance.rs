use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Member id to signed net amount. Positive means the group owes the member,
/// negative means the member owes the group. Missing members are at zero.
pub type BalanceSheet = BTreeMap<String, Decimal>;

/// Stored balance sheet of a group. At most one exists per group and it is
/// always replaced wholesale.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub group_id: String,
    #[schema(value_type = Object)]
    pub balances: BalanceSheet,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}
