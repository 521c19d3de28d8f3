#![deny(missing_docs)]

//! Core library for the docspace ingestion and retrieval pipeline.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Read-only client for the external document store.
pub mod documents;
/// Embedding client abstraction and HTTP adapter.
pub mod embedding;
/// Schedule-intent and relative-date query expansion.
pub mod enhance;
/// Content extractors for text, web page, and stored-PDF sources.
pub mod extract;
/// Text-generation client abstraction and HTTP adapter.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Read-only client for the external object storage service.
pub mod objects;
/// Chunking, namespace resolution, and the ingestion pipeline.
pub mod processing;
/// Queue delivery contract and the ingestion dispatcher.
pub mod queue;
/// Retrieval-generation orchestrator.
pub mod rag;
/// Vector store integration.
pub mod vector;
