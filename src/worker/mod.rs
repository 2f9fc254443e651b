//! Consumer side of the recalculation pipeline.
//!
//! Each worker pulls [`RecalculationRequest`]s off the queue, recomputes the
//! group's balances from its full expense set, stores them, refreshes the
//! cache and only then acknowledges. Recomputation is idempotent, so any
//! number of workers may share a queue and redelivery is always safe.

pub mod outcome;

use crate::constants::{BALANCES_RECALCULATED, MESSAGE_DEAD_LETTERED};
use crate::core::balance_service::BalanceService;
use crate::core::models::message::RecalculationRequest;
use crate::core::services::validate_identifier;
use crate::core::errors::LedgerError;
use crate::infrastructure::bounded;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::queue::{Delivery, MessageQueue};
use crate::infrastructure::storage::Storage;
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub use outcome::{ProcessOutcome, Stage};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub queue_name: String,
    /// Deliveries after which a message is dead-lettered instead of retried.
    pub max_deliveries: u32,
    /// Pause before requeueing a retryable failure.
    pub retry_delay: Duration,
    pub queue_timeout: Duration,
}

impl WorkerSettings {
    pub fn new(queue_name: impl Into<String>) -> Self {
        WorkerSettings {
            queue_name: queue_name.into(),
            max_deliveries: 5,
            retry_delay: Duration::from_millis(500),
            queue_timeout: Duration::from_secs(5),
        }
    }
}

pub struct ExpenseWorker<L: LoggingService, S: Storage, C: Cache, Q: MessageQueue> {
    id: usize,
    queue: Q,
    balances: BalanceService<S, C>,
    logging: L,
    settings: WorkerSettings,
}

impl<L: LoggingService, S: Storage, C: Cache, Q: MessageQueue> ExpenseWorker<L, S, C, Q> {
    pub fn new(id: usize, queue: Q, balances: BalanceService<S, C>, logging: L, settings: WorkerSettings) -> Self {
        ExpenseWorker {
            id,
            queue,
            balances,
            logging,
            settings,
        }
    }

    /// Consumes until `shutdown` turns true or its sender is dropped. A
    /// message already received is processed and settled before returning.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), LedgerError> {
        bounded(
            "queue declare",
            self.settings.queue_timeout,
            self.queue.declare_queue(&self.settings.queue_name),
        )
        .await?;
        info!(worker = self.id, queue = %self.settings.queue_name, "worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            let received = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                received = self.queue.receive(&self.settings.queue_name) => received,
            };

            match received {
                Ok(delivery) => {
                    self.handle(delivery, &mut shutdown).await;
                }
                Err(e) => {
                    warn!(worker = self.id, error = %e, "receive failed");
                    self.back_off(&mut shutdown).await;
                }
            }
        }

        info!(worker = self.id, "worker stopped");
        Ok(())
    }

    /// Processes one delivery and settles it with the channel.
    pub async fn handle(&self, delivery: Delivery, shutdown: &mut watch::Receiver<bool>) -> ProcessOutcome {
        let outcome = self.process(&delivery).await;
        match &outcome {
            ProcessOutcome::Ack => {}
            ProcessOutcome::RejectPermanent { stage, reason } => {
                warn!(worker = self.id, delivery_tag = delivery.delivery_tag, %stage, reason = %reason, "rejecting message");
            }
            ProcessOutcome::RejectRetryable { stage, reason } => {
                warn!(worker = self.id, delivery_tag = delivery.delivery_tag, %stage, reason = %reason, "requeueing message");
                self.back_off(shutdown).await;
            }
        }
        self.settle(&delivery, &outcome).await;
        outcome
    }

    /// Decides the fate of a delivery. Never acks or nacks itself.
    pub async fn process(&self, delivery: &Delivery) -> ProcessOutcome {
        if delivery.delivery_count > self.settings.max_deliveries {
            return ProcessOutcome::RejectPermanent {
                stage: Stage::Received,
                reason: format!("gave up after {} deliveries", delivery.delivery_count - 1),
            };
        }

        let request = match RecalculationRequest::from_bytes(&delivery.body) {
            Ok(request) => request,
            Err(e) => {
                return ProcessOutcome::RejectPermanent {
                    stage: Stage::Received,
                    reason: e.to_string(),
                };
            }
        };
        if let Err(e) = validate_identifier(&request.group_id) {
            return ProcessOutcome::RejectPermanent {
                stage: Stage::Parsed,
                reason: e.to_string(),
            };
        }
        let group_id = request.group_id.as_str();
        debug!(
            worker = self.id,
            group_id,
            expense_id = %request.expense_id,
            redelivered = delivery.redelivered,
            "processing recalculation"
        );

        let balances = match self.balances.compute(group_id).await {
            Ok(balances) => balances,
            Err(e) => return Self::failure(Stage::Parsed, e),
        };
        let balance = match self.balances.persist(group_id, balances).await {
            Ok(balance) => balance,
            Err(e) => return Self::failure(Stage::Computed, e),
        };
        if let Err(e) = self.balances.cache().invalidate_or_refresh(group_id, &balance.balances).await {
            return Self::failure(Stage::Persisted, e);
        }

        info!(worker = self.id, group_id, members = balance.balances.len(), "balances recalculated");
        self.audit(
            BALANCES_RECALCULATED,
            json!({ "expense_id": request.expense_id, "balances": balance.balances }),
            Some(group_id),
        )
        .await;
        ProcessOutcome::Ack
    }

    fn failure(stage: Stage, err: LedgerError) -> ProcessOutcome {
        if err.is_retryable() {
            ProcessOutcome::RejectRetryable {
                stage,
                reason: err.to_string(),
            }
        } else {
            ProcessOutcome::RejectPermanent {
                stage,
                reason: err.to_string(),
            }
        }
    }

    async fn settle(&self, delivery: &Delivery, outcome: &ProcessOutcome) {
        let tag = delivery.delivery_tag;
        let timeout = self.settings.queue_timeout;
        let settled = match outcome {
            ProcessOutcome::Ack => bounded("ack", timeout, self.queue.ack(tag)).await,
            ProcessOutcome::RejectRetryable { .. } => bounded("nack", timeout, self.queue.nack(tag, true)).await,
            ProcessOutcome::RejectPermanent { stage, reason } => {
                self.audit(
                    MESSAGE_DEAD_LETTERED,
                    json!({
                        "queue": delivery.queue,
                        "delivery_count": delivery.delivery_count,
                        "stage": stage.to_string(),
                        "reason": reason,
                        "body": String::from_utf8_lossy(&delivery.body),
                    }),
                    None,
                )
                .await;
                bounded("nack", timeout, self.queue.nack(tag, false)).await
            }
        };
        if let Err(e) = settled {
            // stays unacked on the channel; a broker requeues it when this consumer disconnects
            error!(worker = self.id, delivery_tag = tag, error = %e, "failed to settle delivery");
        }
    }

    async fn back_off(&self, shutdown: &mut watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.settings.retry_delay) => {}
            _ = shutdown.changed() => {}
        }
    }

    async fn audit(&self, action: &str, details: serde_json::Value, group_id: Option<&str>) {
        if let Err(e) = self.logging.log_action(action, details, group_id).await {
            warn!(worker = self.id, action, error = %e, "failed to write audit entry");
        }
    }
}
