use utoipa::OpenApi;

use crate::{
    api::models::{
        AddExpenseRequest, AddMembersRequest, CreateGroupRequest, ErrorResponse, HealthResponse, MessageResponse,
        RecalculationResponse,
    },
    core::models::{audit::AppLog, balance::Balance, expense::Expense, group::Group},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::add_users_to_group,
        super::handlers::create_expense,
        super::handlers::get_expenses,
        super::handlers::get_balances,
        super::handlers::recalculate_balances,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateGroupRequest,
        AddMembersRequest,
        AddExpenseRequest,
        MessageResponse,
        RecalculationResponse,
        HealthResponse,
        ErrorResponse,
        Group,
        Expense,
        Balance,
        AppLog
    )),
    info(
        title = "Splitledger API",
        description = "Shared group expenses with asynchronously recalculated balances",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
