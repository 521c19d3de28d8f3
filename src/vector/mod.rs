//! Vector store integration.
//!
//! The store holds one collection of fragment embeddings. Tenant isolation is
//! enforced by a `namespace` payload field: every fragment is written with
//! exactly one namespace tag, and every search is filtered to exactly one
//! namespace.

/// HTTP client for the vector store REST surface.
pub mod client;
/// Namespace and metadata filter construction.
pub mod filters;
/// Deterministic point ids and payload hashing.
pub mod payload;
/// Shared types used by the vector client and helpers.
pub mod types;

pub use client::VectorClient;
pub use filters::build_query_filter;
pub use payload::{compute_content_hash, deterministic_point_id};
pub use types::{PointInsert, ScoredPoint, VectorError};
