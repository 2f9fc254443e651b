pub mod in_memory;

use crate::core::errors::LedgerError;
use async_trait::async_trait;

/// A message handed to a consumer. It stays unacknowledged until the
/// consumer calls [`MessageQueue::ack`] or [`MessageQueue::nack`].
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub queue: String,
    pub body: Vec<u8>,
    /// True when this message was delivered before and requeued.
    pub redelivered: bool,
    /// How many times this message has been handed out, this delivery included.
    pub delivery_count: u32,
}

/// Durable at-least-once channel with manual acknowledgment.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Declares a durable queue. Declaring an existing queue is a no-op.
    async fn declare_queue(&self, queue: &str) -> Result<(), LedgerError>;
    async fn publish(&self, queue: &str, body: Vec<u8>) -> Result<(), LedgerError>;
    /// Waits for the next message on `queue`. Cancel-safe.
    async fn receive(&self, queue: &str) -> Result<Delivery, LedgerError>;
    async fn ack(&self, delivery_tag: u64) -> Result<(), LedgerError>;
    /// Rejects a delivery. With `requeue` the message goes back to the head of
    /// its queue, otherwise it is dead-lettered.
    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), LedgerError>;
}
