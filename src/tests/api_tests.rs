use crate::api::models::ApiError;
use crate::core::errors::LedgerError;
use axum::{http::StatusCode, response::IntoResponse};

fn status_of(err: LedgerError) -> StatusCode {
    ApiError(err).into_response().status()
}

#[test]
fn test_validation_errors_map_to_bad_request() {
    assert_eq!(
        status_of(LedgerError::invalid_input("amount", "Invalid Amount", "Amount must be greater than 0")),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(LedgerError::InvalidSplitUser("Mallory".to_string())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(LedgerError::InvalidIdentifier("abc".to_string())),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_unknown_group_maps_to_not_found() {
    assert_eq!(
        status_of(LedgerError::GroupNotFound("g1".to_string())),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_lost_trigger_maps_to_service_unavailable() {
    let err = LedgerError::PublishFailure {
        group_id: "g1".to_string(),
        expense_id: "e1".to_string(),
        reason: "channel closed".to_string(),
    };
    assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        status_of(LedgerError::Timeout("find balance".to_string())),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[test]
fn test_infrastructure_errors_map_to_internal_error() {
    assert_eq!(
        status_of(LedgerError::StorageError("down".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of(LedgerError::CacheError("down".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
