//! In-process queue transport backed by a bounded tokio channel.
//!
//! Acknowledgement is a no-op here: the channel hands each message out
//! exactly once, so settling only marks the delivery consumed. A broker-backed
//! transport would carry real ack and reject semantics behind the same trait.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Delivery, QueueConsumer, QueueError};
use crate::processing::IngestionMessage;

/// Create a bounded in-process queue, returning its two ends.
pub fn channel_queue(capacity: usize) -> (QueuePublisher, ChannelConsumer) {
    let (sender, receiver) = mpsc::channel(capacity);
    (QueuePublisher { sender }, ChannelConsumer { receiver })
}

/// Publishing end of the in-process queue.
#[derive(Clone)]
pub struct QueuePublisher {
    sender: mpsc::Sender<Vec<u8>>,
}

impl QueuePublisher {
    /// Serialize and enqueue one ingestion message.
    pub async fn publish(&self, message: &IngestionMessage) -> Result<(), QueueError> {
        let bytes = serde_json::to_vec(message)?;
        self.sender
            .send(bytes)
            .await
            .map_err(|_| QueueError::Closed)
    }

    /// Enqueue raw bytes, bypassing serialization.
    #[cfg(test)]
    pub(crate) async fn publish_bytes(&self, bytes: Vec<u8>) -> Result<(), QueueError> {
        self.sender
            .send(bytes)
            .await
            .map_err(|_| QueueError::Closed)
    }
}

/// Consuming end of the in-process queue.
pub struct ChannelConsumer {
    receiver: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl QueueConsumer for ChannelConsumer {
    async fn next(&mut self) -> Option<Box<dyn Delivery>> {
        self.receiver
            .recv()
            .await
            .map(|payload| Box::new(ChannelDelivery { payload }) as Box<dyn Delivery>)
    }
}

struct ChannelDelivery {
    payload: Vec<u8>,
}

#[async_trait]
impl Delivery for ChannelDelivery {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(self: Box<Self>) -> Result<(), QueueError> {
        Ok(())
    }

    async fn reject(self: Box<Self>) -> Result<(), QueueError> {
        Ok(())
    }
}
