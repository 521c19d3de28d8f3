//! Queue transport contract and the ingestion dispatcher.
//!
//! The broker itself is an external collaborator; this module only defines
//! the delivery contract the dispatcher consumes and an in-process channel
//! transport implementing it. A delivery is settled exactly once: acked
//! after a successful ingestion, or rejected without requeue once retries
//! for transient failures are exhausted. Rejected messages land in a
//! bounded dead-letter store for operator inspection.

mod channel;
mod deadletter;
mod dispatcher;

pub use channel::{ChannelConsumer, QueuePublisher, channel_queue};
pub use deadletter::{DeadLetterEntry, DeadLetterQueue};
pub use dispatcher::{Dispatcher, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the queue transport.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Message could not be serialized for publishing.
    #[error("Failed to serialize queue message: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The transport is closed; no consumer will ever see the message.
    #[error("Queue is closed")]
    Closed,
}

/// A single message handed to the dispatcher, settled exactly once.
#[async_trait]
pub trait Delivery: Send {
    /// Raw message payload bytes.
    fn payload(&self) -> &[u8];
    /// Confirm successful processing.
    async fn ack(self: Box<Self>) -> Result<(), QueueError>;
    /// Discard the message without requeueing it.
    async fn reject(self: Box<Self>) -> Result<(), QueueError>;
}

/// Source of deliveries consumed one at a time.
#[async_trait]
pub trait QueueConsumer: Send {
    /// Await the next delivery, or `None` once the transport is closed.
    async fn next(&mut self) -> Option<Box<dyn Delivery>>;
}
