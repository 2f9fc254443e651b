use crate::constants::{
    EXPENSE_RECORDED, GROUP_CREATED, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MEMBERS_ADDED, PUBLISH_FAILURE_TARGET,
    RECALCULATION_PUBLISH_FAILED, RECALCULATION_REQUESTED,
};
use crate::core::errors::LedgerError;
use crate::core::models::{audit::AppLog, expense::Expense, group::Group, message::RecalculationRequest};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::queue::MessageQueue;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::{Timeouts, bounded};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const MAX_AMOUNT: Decimal = dec!(1000000);

/// Group and expense ids are UUIDs. Member ids are free-form names.
pub fn validate_identifier(id: &str) -> Result<(), LedgerError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| LedgerError::InvalidIdentifier(id.to_string()))
}

pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub paid_by: String,
    pub split_between: Vec<String>,
}

/// Where and how hard the producer tries to enqueue recalculation requests.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    pub queue_name: String,
    pub publish_attempts: u32,
    pub publish_backoff: Duration,
}

impl ProducerSettings {
    pub fn new(queue_name: impl Into<String>) -> Self {
        ProducerSettings {
            queue_name: queue_name.into(),
            publish_attempts: 3,
            publish_backoff: Duration::from_millis(100),
        }
    }
}

pub struct LedgerService<L: LoggingService, S: Storage, Q: MessageQueue> {
    storage: S,
    logging: L,
    queue: Q,
    producer: ProducerSettings,
    timeouts: Timeouts,
}

impl<L: LoggingService, S: Storage, Q: MessageQueue> LedgerService<L, S, Q> {
    pub fn new(storage: S, logging: L, queue: Q, producer: ProducerSettings, timeouts: Timeouts) -> Self {
        LedgerService {
            storage,
            logging,
            queue,
            producer,
            timeouts,
        }
    }

    /// Declares the recalculation queue. Safe to call from every process.
    pub async fn init(&self) -> Result<(), LedgerError> {
        bounded(
            "queue declare",
            self.timeouts.queue,
            self.queue.declare_queue(&self.producer.queue_name),
        )
        .await
    }

    async fn audit(&self, action: &str, details: serde_json::Value, group_id: Option<&str>) {
        if let Err(e) = self.logging.log_action(action, details, group_id).await {
            warn!(action, error = %e, "failed to write audit entry");
        }
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        if value.trim().is_empty() {
            return Err(LedgerError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(LedgerError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(LedgerError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(LedgerError::invalid_input(
                field,
                "Amount Too Large",
                "Amount cannot exceed 1,000,000",
            ));
        }
        if amount.normalize().scale() > 2 {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        Ok(())
    }

    /// Trims, validates and deduplicates member ids, keeping first occurrences.
    fn normalize_members(&self, field: &str, members: Vec<String>) -> Result<Vec<String>, LedgerError> {
        let mut normalized: Vec<String> = Vec::with_capacity(members.len());
        for member in members {
            self.validate_string_input(field, &member, MAX_NAME_LENGTH)?;
            let member = member.trim().to_string();
            if !normalized.contains(&member) {
                normalized.push(member);
            }
        }
        Ok(normalized)
    }

    pub async fn create_group(&self, name: String, members: Vec<String>) -> Result<Group, LedgerError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        let members = self.normalize_members("members", members)?;

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            members,
            created_at: now,
            updated_at: now,
        };
        bounded("insert group", self.timeouts.store, self.storage.insert_group(group.clone())).await?;
        info!(group_id = %group.id, members = group.members.len(), "group created");

        self.audit(
            GROUP_CREATED,
            json!({ "group_id": group.id, "name": group.name, "members": group.members }),
            Some(&group.id),
        )
        .await;
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        validate_identifier(group_id)?;
        bounded("get group", self.timeouts.store, self.storage.get_group(group_id))
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    pub async fn add_members(&self, group_id: &str, members: Vec<String>) -> Result<Group, LedgerError> {
        validate_identifier(group_id)?;
        let members = self.normalize_members("members", members)?;
        if members.is_empty() {
            return Err(LedgerError::invalid_input(
                "members",
                "Invalid members",
                "At least one member is required",
            ));
        }

        let group = bounded(
            "add group members",
            self.timeouts.store,
            self.storage.add_group_members(group_id, &members, Utc::now()),
        )
        .await?
        .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))?;
        info!(group_id, requested = members.len(), total = group.members.len(), "members added");

        self.audit(MEMBERS_ADDED, json!({ "group_id": group_id, "members": members }), Some(group_id))
            .await;
        Ok(group)
    }

    /// Records an expense and asks the worker to recompute the group's balances.
    ///
    /// The expense is the source of truth and is never rolled back. When the
    /// trigger cannot be enqueued the caller gets [`LedgerError::PublishFailure`]
    /// naming the stored expense, so recalculation can be re-requested.
    pub async fn add_expense(&self, group_id: &str, new_expense: NewExpense) -> Result<Expense, LedgerError> {
        let group = self.get_group(group_id).await?;

        self.validate_string_input("description", &new_expense.description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_amount_input("amount", new_expense.amount)?;
        if !group.is_member(&new_expense.paid_by) {
            return Err(LedgerError::InvalidSplitUser(new_expense.paid_by));
        }
        if new_expense.split_between.is_empty() {
            return Err(LedgerError::invalid_input(
                "splitBetween",
                "Invalid split",
                "An expense must be split between at least one member",
            ));
        }
        for (i, member) in new_expense.split_between.iter().enumerate() {
            if !group.is_member(member) {
                return Err(LedgerError::InvalidSplitUser(member.clone()));
            }
            if new_expense.split_between[..i].contains(member) {
                return Err(LedgerError::invalid_input(
                    "splitBetween",
                    "Invalid split",
                    format!("{} is listed more than once", member),
                ));
            }
        }

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group.id.clone(),
            description: new_expense.description.trim().to_string(),
            amount: new_expense.amount,
            paid_by: new_expense.paid_by,
            split_between: new_expense.split_between,
            created_at: Utc::now(),
        };
        bounded("insert expense", self.timeouts.store, self.storage.insert_expense(expense.clone())).await?;
        info!(group_id, expense_id = %expense.id, amount = %expense.amount, "expense recorded");

        self.audit(
            EXPENSE_RECORDED,
            json!({
                "expense_id": expense.id,
                "amount": expense.amount,
                "paid_by": expense.paid_by,
                "split_between": expense.split_between,
            }),
            Some(group_id),
        )
        .await;

        let request = RecalculationRequest {
            group_id: expense.group_id.clone(),
            expense_id: expense.id.clone(),
            amount: expense.amount.to_f64(),
        };
        self.publish_recalculation(&request).await?;
        Ok(expense)
    }

    pub async fn get_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        validate_identifier(group_id)?;
        bounded(
            "find expenses",
            self.timeouts.store,
            self.storage.find_expenses_by_group(group_id),
        )
        .await
    }

    /// Re-enqueues recalculation for a group, referencing its latest expense.
    /// Returns `None` when the group has no expenses and nothing was queued.
    pub async fn request_recalculation(&self, group_id: &str) -> Result<Option<RecalculationRequest>, LedgerError> {
        let group = self.get_group(group_id).await?;
        let expenses = self.get_expenses(&group.id).await?;
        let Some(latest) = expenses.last() else {
            return Ok(None);
        };

        let request = RecalculationRequest {
            group_id: group.id.clone(),
            expense_id: latest.id.clone(),
            amount: latest.amount.to_f64(),
        };
        self.publish_recalculation(&request).await?;
        Ok(Some(request))
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_logs().await
    }

    async fn publish_recalculation(&self, request: &RecalculationRequest) -> Result<(), LedgerError> {
        let body = request
            .to_bytes()
            .map_err(|e| LedgerError::InternalServerError(format!("Failed to encode request: {}", e)))?;

        let mut last_err = None;
        for attempt in 1..=self.producer.publish_attempts {
            match bounded(
                "queue publish",
                self.timeouts.queue,
                self.queue.publish(&self.producer.queue_name, body.clone()),
            )
            .await
            {
                Ok(()) => {
                    self.audit(
                        RECALCULATION_REQUESTED,
                        json!({ "expense_id": request.expense_id, "attempt": attempt }),
                        Some(&request.group_id),
                    )
                    .await;
                    return Ok(());
                }
                Err(e) => {
                    warn!(group_id = %request.group_id, attempt, error = %e, "recalculation publish attempt failed");
                    last_err = Some(e);
                    if attempt < self.producer.publish_attempts {
                        tokio::time::sleep(self.producer.publish_backoff * attempt).await;
                    }
                }
            }
        }

        let reason = last_err.map(|e| e.to_string()).unwrap_or_default();
        error!(
            target: PUBLISH_FAILURE_TARGET,
            group_id = %request.group_id,
            expense_id = %request.expense_id,
            error = %reason,
            "recalculation trigger lost, balances stay stale until re-triggered"
        );
        self.audit(
            RECALCULATION_PUBLISH_FAILED,
            json!({ "expense_id": request.expense_id, "reason": reason }),
            Some(&request.group_id),
        )
        .await;
        Err(LedgerError::PublishFailure {
            group_id: request.group_id.clone(),
            expense_id: request.expense_id.clone(),
            reason,
        })
    }
}
