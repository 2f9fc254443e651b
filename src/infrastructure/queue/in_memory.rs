use crate::core::errors::LedgerError;
use crate::infrastructure::queue::{Delivery, MessageQueue};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{Mutex, Notify};
use tracing::debug;

#[derive(Debug, Clone)]
struct QueuedMessage {
    body: Vec<u8>,
    delivery_count: u32,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<QueuedMessage>,
    dead_letters: Vec<Vec<u8>>,
    notify: Arc<Notify>,
}

struct Unacked {
    queue: String,
    message: QueuedMessage,
}

#[derive(Default)]
struct Broker {
    queues: HashMap<String, QueueState>,
    unacked: HashMap<u64, Unacked>,
    next_tag: u64,
}

impl Broker {
    fn queue_mut(&mut self, queue: &str) -> Result<&mut QueueState, LedgerError> {
        self.queues
            .get_mut(queue)
            .ok_or_else(|| LedgerError::QueueError(format!("queue {} is not declared", queue)))
    }

    fn try_deliver(&mut self, queue: &str) -> Result<Option<Delivery>, LedgerError> {
        let Some(mut message) = self.queue_mut(queue)?.ready.pop_front() else {
            return Ok(None);
        };
        message.delivery_count += 1;
        self.next_tag += 1;
        let delivery = Delivery {
            delivery_tag: self.next_tag,
            queue: queue.to_string(),
            body: message.body.clone(),
            redelivered: message.delivery_count > 1,
            delivery_count: message.delivery_count,
        };
        self.unacked.insert(
            self.next_tag,
            Unacked {
                queue: queue.to_string(),
                message,
            },
        );
        Ok(Some(delivery))
    }

    fn take_unacked(&mut self, delivery_tag: u64) -> Result<Unacked, LedgerError> {
        self.unacked
            .remove(&delivery_tag)
            .ok_or_else(|| LedgerError::QueueError(format!("unknown delivery tag {}", delivery_tag)))
    }
}

/// Single-process broker with the delivery semantics of a durable queue:
/// manual acks, requeue to the head on nack, and a dead-letter list per queue
/// for rejected messages.
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    broker: Arc<Mutex<Broker>>,
    failing_publishes: Arc<AtomicU32>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_publishes(&self, n: u32) {
        self.failing_publishes.store(n, Ordering::SeqCst);
    }

    /// Messages waiting for delivery on `queue`.
    pub async fn ready_count(&self, queue: &str) -> usize {
        let broker = self.broker.lock().await;
        broker.queues.get(queue).map(|q| q.ready.len()).unwrap_or(0)
    }

    /// Messages delivered but neither acked nor nacked.
    pub async fn unacked_count(&self) -> usize {
        self.broker.lock().await.unacked.len()
    }

    pub async fn dead_letters(&self, queue: &str) -> Vec<Vec<u8>> {
        let broker = self.broker.lock().await;
        broker
            .queues
            .get(queue)
            .map(|q| q.dead_letters.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn declare_queue(&self, queue: &str) -> Result<(), LedgerError> {
        let mut broker = self.broker.lock().await;
        broker.queues.entry(queue.to_string()).or_default();
        Ok(())
    }

    async fn publish(&self, queue: &str, body: Vec<u8>) -> Result<(), LedgerError> {
        if self
            .failing_publishes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(LedgerError::QueueError("channel closed".to_string()));
        }
        let mut broker = self.broker.lock().await;
        let state = broker.queue_mut(queue)?;
        state.ready.push_back(QueuedMessage {
            body,
            delivery_count: 0,
        });
        state.notify.notify_waiters();
        Ok(())
    }

    async fn receive(&self, queue: &str) -> Result<Delivery, LedgerError> {
        loop {
            let notify = {
                let mut broker = self.broker.lock().await;
                broker.queue_mut(queue)?.notify.clone()
            };
            let notified = notify.notified();
            tokio::pin!(notified);
            // register before checking so a publish in between is not missed
            notified.as_mut().enable();

            if let Some(delivery) = self.broker.lock().await.try_deliver(queue)? {
                debug!(queue, delivery_tag = delivery.delivery_tag, "message delivered");
                return Ok(delivery);
            }
            notified.await;
        }
    }

    async fn ack(&self, delivery_tag: u64) -> Result<(), LedgerError> {
        let mut broker = self.broker.lock().await;
        broker.take_unacked(delivery_tag)?;
        Ok(())
    }

    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), LedgerError> {
        let mut broker = self.broker.lock().await;
        let Unacked { queue, message } = broker.take_unacked(delivery_tag)?;
        let state = broker.queue_mut(&queue)?;
        if requeue {
            state.ready.push_front(message);
            state.notify.notify_waiters();
        } else {
            state.dead_letters.push(message.body);
        }
        Ok(())
    }
}
