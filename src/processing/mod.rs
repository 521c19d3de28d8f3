//! Ingestion pipeline: chunking, namespace resolution, and the upsert engine.

/// Boundary-aware chunking of extracted text blocks.
pub mod chunking;
/// Tenant-scoped namespace derivation.
pub mod namespace;
/// Ingestion service tying extraction, chunking, and upsert together.
pub mod service;
/// Core data types and error definitions for the processing pipeline.
pub mod types;

pub use namespace::resolve_namespace;
pub use service::IngestionService;
pub use types::{
    ContentType, Fragment, IngestError, IngestOutcome, IngestionMessage, NamespaceError, OwnerType,
    UpsertError,
};
