//! Orchestration of the per-message ingestion pipeline.
//!
//! One call to [`IngestionService::ingest`] carries a queue message through
//! fetch, extract, chunk, embed, and upsert. Every step either completes or
//! fails the whole message; nothing is written unless the full fragment batch
//! embedded successfully.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::chunking::{self, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, MAX_FRAGMENTS};
use super::namespace::resolve_namespace;
use super::types::{
    ContentType, Fragment, IngestError, IngestOutcome, IngestionMessage, UpsertError,
};
use crate::documents::{DocumentMetadata, DocumentStore};
use crate::embedding::EmbeddingClient;
use crate::extract::{DocumentSource, Extractors};
use crate::metrics::IngestionMetrics;
use crate::vector::{PointInsert, VectorClient, compute_content_hash, deterministic_point_id};

/// Pipeline service ingesting one saved document per queue message.
pub struct IngestionService {
    documents: Arc<dyn DocumentStore>,
    extractors: Extractors,
    embeddings: Arc<dyn EmbeddingClient>,
    vectors: Arc<VectorClient>,
    metrics: Arc<IngestionMetrics>,
    leases: DocumentLeases,
    chunk_size: usize,
    chunk_overlap: usize,
}

/// Per-document mutual exclusion.
///
/// Two simultaneous ingestions of the same document would race on the same
/// deterministic point ids; holding a lease for the duration of one attempt
/// serializes them so the later write wins cleanly.
#[derive(Default)]
struct DocumentLeases {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DocumentLeases {
    async fn acquire(&self, document_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(document_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the map entry once nobody holds or awaits the lease.
    async fn release(&self, document_id: &str) {
        let mut map = self.inner.lock().await;
        if let Some(lock) = map.get(document_id)
            && Arc::strong_count(lock) == 1
        {
            map.remove(document_id);
        }
    }
}

impl IngestionService {
    /// Assemble the pipeline from its collaborators.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        extractors: Extractors,
        embeddings: Arc<dyn EmbeddingClient>,
        vectors: Arc<VectorClient>,
        metrics: Arc<IngestionMetrics>,
        chunk_size: Option<usize>,
        chunk_overlap: Option<usize>,
    ) -> Self {
        Self {
            documents,
            extractors,
            embeddings,
            vectors,
            metrics,
            leases: DocumentLeases::default(),
            chunk_size: chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP),
        }
    }

    /// Ingest the document referenced by a queue message.
    ///
    /// Re-ingesting the same document overwrites its fragments in place
    /// because fragment ids, and therefore point ids, are deterministic.
    /// Concurrent ingestions of the same document are serialized by a
    /// per-document lease.
    pub async fn ingest(&self, message: &IngestionMessage) -> Result<IngestOutcome, IngestError> {
        let lease = self.leases.acquire(&message.document_id).await;
        let outcome = self.ingest_locked(message).await;
        drop(lease);
        self.leases.release(&message.document_id).await;
        outcome
    }

    async fn ingest_locked(&self, message: &IngestionMessage) -> Result<IngestOutcome, IngestError> {
        tracing::info!(
            document_id = %message.document_id,
            content_type = ?message.content_type,
            owner_type = ?message.owner_type,
            "Processing ingestion message"
        );

        let document = self
            .documents
            .fetch(&message.document_id)
            .await?
            .ok_or_else(|| IngestError::DocumentNotFound(message.document_id.clone()))?;

        let namespace = resolve_namespace(
            message.owner_type,
            &message.owner_id,
            document.organization_id.as_deref(),
        )?;

        let source = select_source(message, &document)?;
        let blocks = self.extractors.extract(source).await?;
        let chunks = chunking::chunk_blocks(
            blocks,
            self.chunk_size,
            self.chunk_overlap,
            MAX_FRAGMENTS,
        )?;

        if chunks.is_empty() {
            tracing::warn!(
                document_id = %message.document_id,
                namespace = %namespace,
                "Document produced no fragments; nothing to index"
            );
            return Ok(IngestOutcome {
                namespace,
                fragment_count: 0,
            });
        }

        let fragments = build_fragments(message, &document, chunks);
        self.upsert_fragments(&namespace, &fragments).await?;

        self.metrics.record_document(fragments.len() as u64);
        tracing::info!(
            document_id = %message.document_id,
            namespace = %namespace,
            fragments = fragments.len(),
            "Document ingested"
        );
        Ok(IngestOutcome {
            namespace,
            fragment_count: fragments.len(),
        })
    }

    /// Embed the fragment batch and write it as one idempotent upsert.
    async fn upsert_fragments(
        &self,
        namespace: &str,
        fragments: &[Fragment],
    ) -> Result<(), UpsertError> {
        let texts: Vec<String> = fragments
            .iter()
            .map(|fragment| fragment.content.clone())
            .collect();
        let vectors = self.embeddings.embed(texts).await?;

        let points: Vec<PointInsert> = fragments
            .iter()
            .zip(vectors)
            .map(|(fragment, vector)| {
                let mut payload = Map::new();
                payload.insert("text".into(), Value::String(fragment.content.clone()));
                payload.insert("namespace".into(), Value::String(namespace.to_string()));
                payload.insert(
                    "fragment_id".into(),
                    Value::String(fragment.fragment_id.clone()),
                );
                payload.insert("chunk_index".into(), json!(fragment.chunk_index));
                payload.insert("total_chunks".into(), json!(fragment.total_chunks));
                payload.insert(
                    "content_hash".into(),
                    Value::String(compute_content_hash(&fragment.content)),
                );
                for (key, value) in &fragment.metadata {
                    payload.insert(key.clone(), value.clone());
                }

                PointInsert {
                    id: deterministic_point_id(&fragment.fragment_id),
                    vector,
                    payload: Value::Object(payload),
                }
            })
            .collect();

        self.vectors.upsert_points(points).await?;
        Ok(())
    }
}

/// Pick the source material matching the message's declared content type.
fn select_source<'a>(
    message: &IngestionMessage,
    document: &'a DocumentMetadata,
) -> Result<DocumentSource<'a>, IngestError> {
    let missing = |field| IngestError::MissingField {
        document_id: message.document_id.clone(),
        field,
    };
    match message.content_type {
        ContentType::Text => document
            .text_content
            .as_deref()
            .map(|content| DocumentSource::Text { content })
            .ok_or_else(|| missing("textContent")),
        ContentType::Url => document
            .url
            .as_deref()
            .map(|url| DocumentSource::Url { url })
            .ok_or_else(|| missing("url")),
        ContentType::File => document
            .file_key
            .as_deref()
            .map(|file_key| DocumentSource::StoredFile { file_key })
            .ok_or_else(|| missing("fileKey")),
    }
}

/// Turn chunks into fragments carrying merged shared and source metadata.
fn build_fragments(
    message: &IngestionMessage,
    document: &DocumentMetadata,
    chunks: Vec<chunking::Chunk>,
) -> Vec<Fragment> {
    let total_chunks = chunks.len();
    let mut shared = Map::new();
    shared.insert(
        "document_id".into(),
        Value::String(message.document_id.clone()),
    );
    shared.insert("title".into(), Value::String(document.title.clone()));
    shared.insert("content_type".into(), json!(message.content_type));
    shared.insert("owner_type".into(), json!(message.owner_type));
    shared.insert("owner_id".into(), Value::String(message.owner_id.clone()));
    if let Some(organization_id) = &document.organization_id {
        shared.insert(
            "organization_id".into(),
            Value::String(organization_id.clone()),
        );
    }
    shared.insert(
        "created_at".into(),
        Value::String(message.created_at.clone()),
    );

    chunks
        .into_iter()
        .enumerate()
        .map(|(chunk_index, chunk)| {
            let mut metadata = shared.clone();
            for (key, value) in chunk.source_metadata {
                metadata.insert(key, value);
            }
            Fragment {
                fragment_id: format!("{}_chunk_{chunk_index}", message.document_id),
                content: chunk.content,
                chunk_index,
                total_chunks,
                metadata,
            }
        })
        .collect()
}
