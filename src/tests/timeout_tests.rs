use crate::core::balance_cache::BalanceCache;
use crate::core::balance_service::BalanceService;
use crate::core::errors::LedgerError;
use crate::core::models::message::RecalculationRequest;
use crate::core::models::{balance::Balance, expense::Expense, group::Group};
use crate::infrastructure::Timeouts;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::queue::MessageQueue;
use crate::infrastructure::queue::in_memory::InMemoryQueue;
use crate::infrastructure::storage::Storage;
use crate::tests::QUEUE;
use crate::worker::{ExpenseWorker, ProcessOutcome, Stage, WorkerSettings};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::pending;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// A store that accepts calls and never answers.
struct UnresponsiveStorage;

#[async_trait]
impl Storage for UnresponsiveStorage {
    async fn insert_group(&self, _group: Group) -> Result<(), LedgerError> {
        pending().await
    }

    async fn get_group(&self, _group_id: &str) -> Result<Option<Group>, LedgerError> {
        pending().await
    }

    async fn add_group_members(
        &self,
        _group_id: &str,
        _members: &[String],
        _updated_at: DateTime<Utc>,
    ) -> Result<Option<Group>, LedgerError> {
        pending().await
    }

    async fn insert_expense(&self, _expense: Expense) -> Result<(), LedgerError> {
        pending().await
    }

    async fn find_expenses_by_group(&self, _group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        pending().await
    }

    async fn find_balance(&self, _group_id: &str) -> Result<Option<Balance>, LedgerError> {
        pending().await
    }

    async fn upsert_balance(&self, _balance: Balance) -> Result<(), LedgerError> {
        pending().await
    }
}

fn unresponsive_balances() -> BalanceService<UnresponsiveStorage, InMemoryCache> {
    let timeouts = Timeouts::default();
    BalanceService::new(
        UnresponsiveStorage,
        BalanceCache::new(InMemoryCache::new(), Duration::from_secs(60), timeouts.cache),
        timeouts,
    )
}

#[tokio::test(start_paused = true)]
async fn test_balance_read_times_out_on_hanging_store() {
    let balances = unresponsive_balances();

    let result = balances.get_balances(&Uuid::new_v4().to_string()).await;

    assert!(matches!(result, Err(LedgerError::Timeout(_))), "{:?}", result);
}

#[tokio::test(start_paused = true)]
async fn test_worker_requeues_when_store_hangs() {
    let queue = InMemoryQueue::new();
    queue.declare_queue(QUEUE).await.unwrap();
    let worker = ExpenseWorker::new(
        1,
        queue.clone(),
        unresponsive_balances(),
        InMemoryLogging::new(),
        WorkerSettings {
            retry_delay: Duration::ZERO,
            ..WorkerSettings::new(QUEUE)
        },
    );
    let request = RecalculationRequest {
        group_id: Uuid::new_v4().to_string(),
        expense_id: Uuid::new_v4().to_string(),
        amount: Some(12.5),
    };
    queue.publish(QUEUE, request.to_bytes().unwrap()).await.unwrap();
    let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let delivery = queue.receive(QUEUE).await.unwrap();
    let outcome = worker.handle(delivery, &mut shutdown_rx).await;

    match outcome {
        ProcessOutcome::RejectRetryable { stage, reason } => {
            assert_eq!(stage, Stage::Parsed);
            assert!(reason.contains("find expenses"), "{}", reason);
        }
        other => panic!("expected a retryable rejection, got {:?}", other),
    }
    assert_eq!(queue.ready_count(QUEUE).await, 1);
    assert_eq!(queue.unacked_count().await, 0);
    let redelivered = queue.receive(QUEUE).await.unwrap();
    assert!(redelivered.redelivered);
}
