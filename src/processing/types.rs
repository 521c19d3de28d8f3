//! Core data types and error definitions for the processing pipeline.

use crate::documents::DocumentStoreError;
use crate::embedding::EmbeddingError;
use crate::extract::ExtractionError;
use crate::vector::VectorError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Ownership scope declared on a saved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerType {
    /// Document belongs to an individual user.
    Personal,
    /// Document belongs to an organization.
    Organization,
}

/// Declared shape of a document's source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    /// Inline plain text stored with the document record.
    Text,
    /// A single web page referenced by URL.
    Url,
    /// A stored file (PDF) referenced by storage key.
    File,
}

/// Queue message emitted once per saved document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionMessage {
    /// Identifier of the saved document to ingest.
    pub document_id: String,
    /// Ownership scope of the document.
    pub owner_type: OwnerType,
    /// Identifier of the owning user.
    pub owner_id: String,
    /// Declared content type selecting the extractor.
    pub content_type: ContentType,
    /// ISO-8601 creation timestamp of the document record.
    pub created_at: String,
}

/// A bounded slice of extracted text plus metadata, the unit stored in the vector store.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Fragment text content.
    pub content: String,
    /// Zero-based position of the fragment within its ingestion batch.
    pub chunk_index: usize,
    /// Total fragment count of the ingestion batch.
    pub total_chunks: usize,
    /// Deterministic identifier: `{document_id}_chunk_{chunk_index}`.
    pub fragment_id: String,
    /// Merged source and shared metadata attached to the fragment.
    pub metadata: Map<String, Value>,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Namespace the fragments were written to.
    pub namespace: String,
    /// Number of fragments written.
    pub fragment_count: usize,
}

/// Errors produced while splitting text blocks into fragments.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunking configured an impossible fragment size.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for new content in each fragment.
    #[error("chunk overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidOverlap {
        /// Configured overlap in characters.
        overlap: usize,
        /// Configured fragment size in characters.
        chunk_size: usize,
    },
    /// The source produced more fragments than the configured ceiling allows.
    #[error("fragment count {count} exceeds the limit of {limit}")]
    TooManyFragments {
        /// Number of fragments the source would produce.
        count: usize,
        /// Configured fragment ceiling.
        limit: usize,
    },
}

/// Errors raised while deriving the tenant-scoped storage namespace.
#[derive(Debug, Error)]
pub enum NamespaceError {
    /// Organization ownership was declared without an organization id.
    #[error("owner type is ORGANIZATION but no organization id was supplied")]
    MissingOrganizationId,
    /// No owner id was available to derive a personal namespace.
    #[error("no owner id was supplied")]
    MissingOwnerId,
}

/// Errors raised while embedding and writing a fragment batch.
#[derive(Debug, Error)]
pub enum UpsertError {
    /// Embedding endpoint failed to produce vectors for the batch.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Vector store rejected or failed the batch write.
    #[error("Vector store write failed: {0}")]
    Vector(#[from] VectorError),
}

/// Errors terminating the ingestion of a single queue message.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Message payload was malformed or incomplete.
    #[error("Invalid ingestion message: {0}")]
    Validation(String),
    /// Referenced document does not exist in the document store.
    #[error("Document {0} not found")]
    DocumentNotFound(String),
    /// Document record lacks the field required by its declared content type.
    #[error("Document {document_id} is missing required field `{field}`")]
    MissingField {
        /// Identifier of the incomplete document.
        document_id: String,
        /// Name of the absent field.
        field: &'static str,
    },
    /// Document store read failed.
    #[error("Document store read failed: {0}")]
    Store(#[from] DocumentStoreError),
    /// Source extraction failed.
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    /// Chunking failed or tripped the fragment-count guard.
    #[error("Chunking failed: {0}")]
    Chunking(#[from] ChunkingError),
    /// Ownership data was insufficient to route storage.
    #[error("Namespace resolution failed: {0}")]
    Namespace(#[from] NamespaceError),
    /// Embedding or vector-store write failed.
    #[error("Upsert failed: {0}")]
    Upsert(#[from] UpsertError),
}
