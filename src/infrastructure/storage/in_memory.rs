use crate::core::errors::LedgerError;
use crate::core::models::{balance::Balance, expense::Expense, group::Group};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Consumes one pending injected failure, if any.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<HashMap<String, Group>>>,
    expenses: Arc<RwLock<HashMap<String, Vec<Expense>>>>,
    balances: Arc<RwLock<HashMap<String, Balance>>>,
    failing_expense_inserts: Arc<AtomicU32>,
    failing_expense_reads: Arc<AtomicU32>,
    failing_balance_upserts: Arc<AtomicU32>,
    failing_balance_reads: Arc<AtomicU32>,
    balance_reads: Arc<AtomicU64>,
    balance_upserts: Arc<AtomicU64>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` expense inserts fail as if the store were unreachable.
    pub fn fail_next_expense_inserts(&self, n: u32) {
        self.failing_expense_inserts.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_expense_reads(&self, n: u32) {
        self.failing_expense_reads.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_balance_upserts(&self, n: u32) {
        self.failing_balance_upserts.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_balance_reads(&self, n: u32) {
        self.failing_balance_reads.store(n, Ordering::SeqCst);
    }

    /// Number of `find_balance` calls served so far.
    pub fn balance_reads(&self) -> u64 {
        self.balance_reads.load(Ordering::SeqCst)
    }

    /// Number of successful `upsert_balance` calls so far.
    pub fn balance_upserts(&self) -> u64 {
        self.balance_upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_group(&self, group: Group) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group.id) {
            return Err(LedgerError::StorageError(format!("Duplicate group id {}", group.id)));
        }
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn add_group_members(
        &self,
        group_id: &str,
        members: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Group>, LedgerError> {
        let mut groups = self.groups.write().await;
        Ok(groups.get_mut(group_id).map(|group| {
            group.add_members(members);
            group.updated_at = updated_at;
            group.clone()
        }))
    }

    async fn insert_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        if take_failure(&self.failing_expense_inserts) {
            return Err(LedgerError::StorageError("expenses collection unavailable".to_string()));
        }
        let mut expenses = self.expenses.write().await;
        expenses.entry(expense.group_id.clone()).or_default().push(expense);
        Ok(())
    }

    async fn find_expenses_by_group(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        if take_failure(&self.failing_expense_reads) {
            return Err(LedgerError::StorageError("expenses collection unavailable".to_string()));
        }
        let expenses = self.expenses.read().await;
        Ok(expenses.get(group_id).cloned().unwrap_or_default())
    }

    async fn find_balance(&self, group_id: &str) -> Result<Option<Balance>, LedgerError> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_balance_reads) {
            return Err(LedgerError::StorageError("balances collection unavailable".to_string()));
        }
        let balances = self.balances.read().await;
        Ok(balances.get(group_id).cloned())
    }

    async fn upsert_balance(&self, balance: Balance) -> Result<(), LedgerError> {
        if take_failure(&self.failing_balance_upserts) {
            return Err(LedgerError::StorageError("balances collection unavailable".to_string()));
        }
        let mut balances = self.balances.write().await;
        balances.insert(balance.group_id.clone(), balance);
        self.balance_upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
