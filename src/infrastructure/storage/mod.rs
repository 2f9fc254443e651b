use crate::core::errors::LedgerError;
use crate::core::models::{balance::Balance, expense::Expense, group::Group};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable document store holding the `groups`, `expenses` and `balances`
/// collections.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn insert_group(&self, group: Group) -> Result<(), LedgerError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    /// Set-union of `members` into the group. `None` when the group does not exist.
    async fn add_group_members(
        &self,
        group_id: &str,
        members: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Group>, LedgerError>;
    async fn insert_expense(&self, expense: Expense) -> Result<(), LedgerError>;
    async fn find_expenses_by_group(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError>;
    async fn find_balance(&self, group_id: &str) -> Result<Option<Balance>, LedgerError>;
    /// Replaces the group's balance record, creating it if absent.
    async fn upsert_balance(&self, balance: Balance) -> Result<(), LedgerError>;
}

pub mod in_memory;
