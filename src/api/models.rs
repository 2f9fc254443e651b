use axum::{Json, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::core::errors::LedgerError;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMembersRequest {
    pub members: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddExpenseRequest {
    pub description: String,
    #[schema(value_type = f64, example = 1500.0)]
    pub amount: Decimal,
    pub paid_by: String,
    pub split_between: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationResponse {
    pub queued: bool,
    pub expense_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for LedgerError to implement IntoResponse
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self.0 {
            LedgerError::InvalidInput(field, detail) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid input for {}: {}", field, detail.description),
            ),
            LedgerError::InvalidSplitUser(id) => (
                StatusCode::BAD_REQUEST,
                format!("{} is not a member of this group", id),
            ),
            LedgerError::InvalidIdentifier(id) => (StatusCode::BAD_REQUEST, format!("Invalid identifier: {}", id)),
            LedgerError::MalformedMessage(msg) => (StatusCode::BAD_REQUEST, format!("Malformed request: {}", msg)),
            LedgerError::GroupNotFound(id) => (StatusCode::NOT_FOUND, format!("Group {} not found", id)),
            LedgerError::PublishFailure { expense_id, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!(
                    "Expense {} was recorded but balances could not be scheduled for recalculation; retry via the recalculate endpoint",
                    expense_id
                ),
            ),
            LedgerError::Timeout(msg) => {
                error!(error = %msg, "request failed on a timed out dependency");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            err @ (LedgerError::StorageError(_)
            | LedgerError::CacheError(_)
            | LedgerError::QueueError(_)
            | LedgerError::InternalServerError(_)) => {
                error!(error = %err, "request failed on infrastructure error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
