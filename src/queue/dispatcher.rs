//! Queue consumption loop feeding the ingestion pipeline.

use std::sync::Arc;
use std::time::Duration;

use super::deadletter::DeadLetterQueue;
use super::{Delivery, QueueConsumer};
use crate::metrics::IngestionMetrics;
use crate::processing::{IngestError, IngestionMessage, IngestionService};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Bounded retry policy applied to transient ingestion failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per message, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each subsequent one.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

/// Consumes deliveries one at a time and settles each against the pipeline.
pub struct Dispatcher {
    service: Arc<IngestionService>,
    metrics: Arc<IngestionMetrics>,
    dead_letters: Arc<DeadLetterQueue>,
    retry: RetryPolicy,
}

impl Dispatcher {
    /// Bind the dispatcher to a pipeline with the default retry policy.
    pub fn new(
        service: Arc<IngestionService>,
        metrics: Arc<IngestionMetrics>,
        dead_letters: Arc<DeadLetterQueue>,
    ) -> Self {
        Self {
            service,
            metrics,
            dead_letters,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Drain the consumer until the transport closes.
    ///
    /// Strictly one message is in flight at a time; the next delivery is not
    /// requested until the current one has been settled.
    pub async fn run<C: QueueConsumer>(&self, mut consumer: C) {
        tracing::info!("Ingestion dispatcher started");
        while let Some(delivery) = consumer.next().await {
            self.handle(delivery).await;
        }
        tracing::info!("Queue closed; ingestion dispatcher stopped");
    }

    /// Process one delivery and settle it exactly once.
    ///
    /// Transient failures are retried with doubling backoff up to the policy
    /// limit; terminal failures and exhausted retries dead-letter the message
    /// and reject it without requeueing.
    async fn handle(&self, delivery: Box<dyn Delivery>) {
        let message: IngestionMessage = match serde_json::from_slice(delivery.payload()) {
            Ok(message) => message,
            Err(error) => {
                self.discard(delivery, None, IngestError::Validation(error.to_string()), 1)
                    .await;
                return;
            }
        };
        if let Err(error) = validate(&message) {
            self.discard(delivery, Some(message.document_id), error, 1)
                .await;
            return;
        }

        let mut attempt = 1;
        loop {
            match self.service.ingest(&message).await {
                Ok(_) => {
                    if let Err(error) = delivery.ack().await {
                        tracing::warn!(error = %error, "Failed to ack delivery");
                    }
                    return;
                }
                Err(error) if is_transient(&error) && attempt < self.retry.max_attempts => {
                    let backoff = self.retry.initial_backoff * 2u32.pow(attempt - 1);
                    tracing::warn!(
                        document_id = %message.document_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Transient ingestion failure; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => {
                    self.discard(delivery, Some(message.document_id), error, attempt)
                        .await;
                    return;
                }
            }
        }
    }

    async fn discard(
        &self,
        delivery: Box<dyn Delivery>,
        document_id: Option<String>,
        error: IngestError,
        attempts: u32,
    ) {
        tracing::error!(
            document_id = document_id.as_deref().unwrap_or("<unparsed>"),
            attempts,
            error = %error,
            "Rejecting ingestion message"
        );
        self.metrics.record_rejected();
        self.dead_letters
            .push(document_id, error.to_string(), attempts)
            .await;
        if let Err(error) = delivery.reject().await {
            tracing::warn!(error = %error, "Failed to reject delivery");
        }
    }
}

fn validate(message: &IngestionMessage) -> Result<(), IngestError> {
    if message.document_id.trim().is_empty() {
        return Err(IngestError::Validation("documentId must not be empty".into()));
    }
    if message.owner_id.trim().is_empty() {
        return Err(IngestError::Validation("ownerId must not be empty".into()));
    }
    Ok(())
}

/// Failures worth retrying: upstream I/O that may recover on its own.
/// Malformed messages, missing documents, and chunking guards never will.
fn is_transient(error: &IngestError) -> bool {
    use crate::extract::ExtractionError;
    match error {
        IngestError::Store(_) | IngestError::Upsert(_) => true,
        IngestError::Extraction(ExtractionError::Fetch(_) | ExtractionError::Object(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::HttpDocumentStore;
    use crate::embedding::HttpEmbeddingClient;
    use crate::extract::{Extractors, PdfExtractor, UrlExtractor};
    use crate::objects::HttpObjectStore;
    use crate::processing::{ContentType, OwnerType};
    use crate::queue::channel_queue;
    use crate::vector::VectorClient;
    use httpmock::{Method::GET, Method::POST, Method::PUT, MockServer};
    use reqwest::Client;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn pipeline(
        documents: &MockServer,
        embeddings: &MockServer,
        vectors: &MockServer,
    ) -> (Dispatcher, Arc<IngestionMetrics>, Arc<DeadLetterQueue>) {
        let client = Client::new();
        let metrics = Arc::new(IngestionMetrics::new());
        let dead_letters = Arc::new(DeadLetterQueue::new(16));
        let objects = Arc::new(HttpObjectStore::new(client.clone(), documents.base_url()));
        let service = Arc::new(IngestionService::new(
            Arc::new(HttpDocumentStore::new(client.clone(), documents.base_url())),
            Extractors::new(
                UrlExtractor::new(client.clone()),
                PdfExtractor::new(objects),
            ),
            Arc::new(HttpEmbeddingClient::new(
                client.clone(),
                embeddings.url("/embed"),
                None,
                2,
            )),
            Arc::new(VectorClient::for_endpoint(
                client,
                vectors.base_url(),
                "documents",
                None,
            )),
            Arc::clone(&metrics),
            None,
            None,
        ));
        let dispatcher = Dispatcher::new(service, Arc::clone(&metrics), Arc::clone(&dead_letters))
            .with_retry_policy(fast_retry());
        (dispatcher, metrics, dead_letters)
    }

    fn message() -> IngestionMessage {
        IngestionMessage {
            document_id: "d1".into(),
            owner_type: OwnerType::Personal,
            owner_id: "u1".into(),
            content_type: ContentType::Text,
            created_at: "2025-08-27T10:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn acks_successful_ingestion() {
        let documents = MockServer::start_async().await;
        let embeddings = MockServer::start_async().await;
        let vectors = MockServer::start_async().await;

        documents
            .mock_async(|when, then| {
                when.method(GET).path("/documents/d1");
                then.status(200).json_body(serde_json::json!({
                    "title": "Notes",
                    "textContent": "hello fragment world",
                    "ownerId": "u1"
                }));
            })
            .await;
        embeddings
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(serde_json::json!([[0.1, 0.2]]));
            })
            .await;
        let upsert = vectors
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/documents/points");
                then.status(200).json_body(serde_json::json!({ "status": "ok" }));
            })
            .await;

        let (dispatcher, metrics, dead_letters) = pipeline(&documents, &embeddings, &vectors);
        let (publisher, consumer) = channel_queue(4);
        publisher.publish(&message()).await.unwrap();
        drop(publisher);
        dispatcher.run(consumer).await;

        upsert.assert();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_ingested, 1);
        assert_eq!(snapshot.messages_rejected, 0);
        assert!(dead_letters.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_dead_lettered_without_retry() {
        let documents = MockServer::start_async().await;
        let embeddings = MockServer::start_async().await;
        let vectors = MockServer::start_async().await;

        let (dispatcher, metrics, dead_letters) = pipeline(&documents, &embeddings, &vectors);
        let (publisher, consumer) = channel_queue(4);
        publisher.publish_bytes(b"not json".to_vec()).await.unwrap();
        drop(publisher);
        dispatcher.run(consumer).await;

        assert_eq!(metrics.snapshot().messages_rejected, 1);
        assert_eq!(metrics.snapshot().documents_ingested, 0);
        let entries = dead_letters.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].document_id.is_none());
        assert_eq!(entries[0].attempts, 1);
    }

    #[tokio::test]
    async fn missing_document_is_terminal() {
        let documents = MockServer::start_async().await;
        let embeddings = MockServer::start_async().await;
        let vectors = MockServer::start_async().await;

        let fetch = documents
            .mock_async(|when, then| {
                when.method(GET).path("/documents/d1");
                then.status(404);
            })
            .await;

        let (dispatcher, metrics, dead_letters) = pipeline(&documents, &embeddings, &vectors);
        let (publisher, consumer) = channel_queue(4);
        publisher.publish(&message()).await.unwrap();
        drop(publisher);
        dispatcher.run(consumer).await;

        // NotFound never recovers; exactly one fetch, no retries.
        fetch.assert_hits(1);
        assert_eq!(metrics.snapshot().messages_rejected, 1);
        let entries = dead_letters.snapshot().await;
        assert_eq!(entries[0].document_id.as_deref(), Some("d1"));
        assert_eq!(entries[0].attempts, 1);
    }

    #[tokio::test]
    async fn transient_store_failure_is_retried_until_exhausted() {
        let documents = MockServer::start_async().await;
        let embeddings = MockServer::start_async().await;
        let vectors = MockServer::start_async().await;

        let fetch = documents
            .mock_async(|when, then| {
                when.method(GET).path("/documents/d1");
                then.status(500).body("store down");
            })
            .await;

        let (dispatcher, metrics, dead_letters) = pipeline(&documents, &embeddings, &vectors);
        let (publisher, consumer) = channel_queue(4);
        publisher.publish(&message()).await.unwrap();
        drop(publisher);
        dispatcher.run(consumer).await;

        fetch.assert_hits(3);
        assert_eq!(metrics.snapshot().messages_rejected, 1);
        assert_eq!(dead_letters.snapshot().await[0].attempts, 3);
    }

    #[tokio::test]
    async fn rejects_empty_document_id() {
        let documents = MockServer::start_async().await;
        let embeddings = MockServer::start_async().await;
        let vectors = MockServer::start_async().await;

        let (dispatcher, metrics, dead_letters) = pipeline(&documents, &embeddings, &vectors);
        let (publisher, consumer) = channel_queue(4);
        let mut bad = message();
        bad.document_id = "  ".into();
        publisher.publish(&bad).await.unwrap();
        drop(publisher);
        dispatcher.run(consumer).await;

        assert_eq!(metrics.snapshot().messages_rejected, 1);
        assert_eq!(dead_letters.snapshot().await.len(), 1);
    }
}
