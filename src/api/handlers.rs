use crate::{
    api::models::*,
    core::{
        balance_service::BalanceService,
        models::{audit::AppLog, balance::BalanceSheet, expense::Expense, group::Group},
        services::{LedgerService, NewExpense},
    },
    infrastructure::{
        cache::in_memory::InMemoryCache, logging::in_memory::InMemoryLogging, queue::in_memory::InMemoryQueue,
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::collections::HashMap;
use std::sync::Arc;

pub type Ledger = LedgerService<InMemoryLogging, InMemoryStorage, InMemoryQueue>;
pub type Balances = BalanceService<InMemoryStorage, InMemoryCache>;

pub struct AppState {
    pub ledger: Ledger,
    pub balances: Balances,
}

// Define API routes
pub fn api_routes(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/groups", post(create_group))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/users", post(add_users_to_group))
        .route("/groups/{group_id}/expenses", post(create_expense).get(get_expenses))
        .route("/groups/{group_id}/balances", get(get_balances))
        .route("/groups/{group_id}/balances/recalculate", post(recalculate_balances))
        .route("/logs", get(get_app_logs));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = state.ledger.create_group(req.name, req.members).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Group found", body = Group),
        (status = 400, description = "Invalid group id", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = state.ledger.get_group(&group_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/users",
    params(("group_id" = String, Path, description = "ID of the group")),
    request_body = AddMembersRequest,
    responses(
        (status = 200, description = "Users added", body = MessageResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
async fn add_users_to_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMembersRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.ledger.add_members(&group_id, req.members).await?;
    Ok(Json(MessageResponse {
        message: "Users added successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/expenses",
    params(("group_id" = String, Path, description = "ID of the group")),
    request_body = AddExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded and recalculation queued", body = Expense),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 503, description = "Expense recorded but recalculation not queued", body = ErrorResponse)
    )
)]
async fn create_expense(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = state
        .ledger
        .add_expense(
            &group_id,
            NewExpense {
                description: req.description,
                amount: req.amount,
                paid_by: req.paid_by,
                split_between: req.split_between,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/expenses",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Expenses of the group", body = Vec<Expense>),
        (status = 400, description = "Invalid group id", body = ErrorResponse)
    )
)]
async fn get_expenses(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = state.ledger.get_expenses(&group_id).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/balances",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Net balance per member", body = HashMap<String, f64>),
        (status = 400, description = "Invalid group id", body = ErrorResponse)
    )
)]
async fn get_balances(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<BalanceSheet>, ApiError> {
    let balances = state.balances.get_balances(&group_id).await?;
    Ok(Json(balances))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/balances/recalculate",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 202, description = "Recalculation queued", body = RecalculationResponse),
        (status = 200, description = "Group has no expenses, nothing queued", body = RecalculationResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 503, description = "Recalculation could not be queued", body = ErrorResponse)
    )
)]
async fn recalculate_balances(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<(StatusCode, Json<RecalculationResponse>), ApiError> {
    let response = match state.ledger.request_recalculation(&group_id).await? {
        Some(request) => (
            StatusCode::ACCEPTED,
            Json(RecalculationResponse {
                queued: true,
                expense_id: Some(request.expense_id),
            }),
        ),
        None => (
            StatusCode::OK,
            Json(RecalculationResponse {
                queued: false,
                expense_id: None,
            }),
        ),
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v1/logs",
    responses((status = 200, description = "Audit trail", body = Vec<AppLog>))
)]
async fn get_app_logs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = state.ledger.get_app_logs().await?;
    Ok(Json(logs))
}
