use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize, Clone, PartialEq)]
pub enum LedgerError {
    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Payer or participant is not a member of the group
    #[error("Invalid split user: {0}")]
    InvalidSplitUser(String),

    /// Identifier is not a well-formed id
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Queue payload could not be decoded
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Queue error: {0}")]
    QueueError(String),

    /// An external call did not complete before its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Expense was stored but the recalculation trigger could not be enqueued
    #[error("Expense {expense_id} stored but recalculation for group {group_id} was not queued: {reason}")]
    PublishFailure {
        group_id: String,
        expense_id: String,
        reason: String,
    },

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl LedgerError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        LedgerError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: title.into(),
                description: description.into(),
            },
        )
    }

    /// Failures that may succeed if the same work is attempted again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::StorageError(_)
                | LedgerError::CacheError(_)
                | LedgerError::QueueError(_)
                | LedgerError::Timeout(_)
                | LedgerError::PublishFailure { .. }
        )
    }
}
