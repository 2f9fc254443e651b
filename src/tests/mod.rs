mod api_tests;
mod expense_tests;
mod timeout_tests;

use crate::core::balance_cache::BalanceCache;
use crate::core::balance_service::BalanceService;
use crate::core::models::group::Group;
use crate::core::services::{LedgerService, NewExpense, ProducerSettings};
use crate::infrastructure::Timeouts;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::queue::MessageQueue;
use crate::infrastructure::queue::in_memory::InMemoryQueue;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::worker::{ExpenseWorker, ProcessOutcome, WorkerSettings};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::watch;

pub const QUEUE: &str = "expense_added";
pub const MAX_DELIVERIES: u32 = 3;

pub type TestLedger = LedgerService<InMemoryLogging, InMemoryStorage, InMemoryQueue>;
pub type TestBalances = BalanceService<InMemoryStorage, InMemoryCache>;
pub type TestWorker = ExpenseWorker<InMemoryLogging, InMemoryStorage, InMemoryCache, InMemoryQueue>;

pub struct Harness {
    pub storage: InMemoryStorage,
    pub cache: InMemoryCache,
    pub queue: InMemoryQueue,
    pub logging: InMemoryLogging,
    pub ledger: TestLedger,
    pub balances: TestBalances,
    pub worker: TestWorker,
    pub shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

pub async fn harness() -> Harness {
    let storage = InMemoryStorage::new();
    let cache = InMemoryCache::new();
    let queue = InMemoryQueue::new();
    let logging = InMemoryLogging::new();

    let producer = ProducerSettings {
        publish_backoff: Duration::ZERO,
        ..ProducerSettings::new(QUEUE)
    };
    let ledger = LedgerService::new(
        storage.clone(),
        logging.clone(),
        queue.clone(),
        producer,
        Timeouts::default(),
    );
    ledger.init().await.unwrap();

    let balances = balance_service(&storage, &cache, Duration::from_secs(30 * 60));
    let worker = worker(1, &storage, &cache, &queue, &logging);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    Harness {
        storage,
        cache,
        queue,
        logging,
        ledger,
        balances,
        worker,
        shutdown_tx,
        shutdown_rx,
    }
}

pub fn balance_service(storage: &InMemoryStorage, cache: &InMemoryCache, ttl: Duration) -> TestBalances {
    let timeouts = Timeouts::default();
    BalanceService::new(storage.clone(), BalanceCache::new(cache.clone(), ttl, timeouts.cache), timeouts)
}

pub fn worker(
    id: usize,
    storage: &InMemoryStorage,
    cache: &InMemoryCache,
    queue: &InMemoryQueue,
    logging: &InMemoryLogging,
) -> TestWorker {
    let settings = WorkerSettings {
        max_deliveries: MAX_DELIVERIES,
        retry_delay: Duration::ZERO,
        ..WorkerSettings::new(QUEUE)
    };
    ExpenseWorker::new(
        id,
        queue.clone(),
        balance_service(storage, cache, Duration::from_secs(30 * 60)),
        logging.clone(),
        settings,
    )
}

impl Harness {
    pub async fn group(&self, members: &[&str]) -> Group {
        self.ledger
            .create_group("Trip".to_string(), members.iter().map(|m| m.to_string()).collect())
            .await
            .unwrap()
    }

    /// Receives the next message and runs it through the worker.
    pub async fn process_next(&mut self) -> ProcessOutcome {
        let delivery = tokio::time::timeout(Duration::from_secs(1), self.queue.receive(QUEUE))
            .await
            .expect("no message on the queue")
            .unwrap();
        self.worker.handle(delivery, &mut self.shutdown_rx).await
    }
}

pub fn new_expense(description: &str, amount: Decimal, paid_by: &str, split_between: &[&str]) -> NewExpense {
    NewExpense {
        description: description.to_string(),
        amount,
        paid_by: paid_by.to_string(),
        split_between: split_between.iter().map(|m| m.to_string()).collect(),
    }
}
