use crate::core::errors::LedgerError;
use serde::{Deserialize, Serialize};

/// Queue payload asking the worker to recompute a group's balances.
///
/// `amount` is informational and may be missing; the worker always re-reads
/// every expense of the group.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationRequest {
    pub group_id: String,
    pub expense_id: String,
    #[serde(default)]
    pub amount: Option<f64>,
}

impl RecalculationRequest {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(body: &[u8]) -> Result<Self, LedgerError> {
        serde_json::from_slice(body).map_err(|e| LedgerError::MalformedMessage(e.to_string()))
    }
}
