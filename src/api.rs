//! HTTP routing and REST handlers.
//!
//! `POST /query` answers a question against the caller's namespace,
//! `POST /documents` enqueues an ingestion message, `GET /metrics` reports
//! ingestion counters, and `GET /dead-letters` lists messages that exhausted
//! their retries. The caller's identity arrives in the `x-owner-id` header;
//! organization scope additionally requires an `organizationId` in the
//! request body.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::enhance::enhance_query;
use crate::metrics::IngestionMetrics;
use crate::processing::{IngestionMessage, NamespaceError, OwnerType, resolve_namespace};
use crate::queue::{DeadLetterQueue, QueueError, QueuePublisher};
use crate::rag::{DEFAULT_TOP_K, QueryError, RagService};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Query-side retrieval and generation service.
    pub rag: Arc<RagService>,
    /// Publisher feeding the ingestion queue.
    pub publisher: QueuePublisher,
    /// Ingestion counters exposed on `/metrics`.
    pub metrics: Arc<IngestionMetrics>,
    /// Dead-lettered messages exposed on `/dead-letters`.
    pub dead_letters: Arc<DeadLetterQueue>,
}

/// Build the application router.
pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/query", post(handle_query))
        .route("/documents", post(handle_enqueue))
        .route("/metrics", get(handle_metrics))
        .route("/dead-letters", get(handle_dead_letters))
        .with_state(state)
}

/// Ownership scope declared on a query request.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum QueryScope {
    /// Search the caller's personal namespace.
    User,
    /// Search an organization namespace.
    Organization,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    query: String,
    #[serde(rename = "type")]
    scope: QueryScope,
    #[serde(default)]
    organization_id: Option<String>,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    filter: Option<Map<String, Value>>,
}

/// Errors mapped onto HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request was malformed or incomplete.
    #[error("{0}")]
    Validation(String),
    /// Ownership data was insufficient to route the query.
    #[error("{0}")]
    Namespace(#[from] NamespaceError),
    /// Query pipeline failed.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Ingestion queue refused the message.
    #[error("Failed to enqueue message: {0}")]
    Enqueue(#[from] QueueError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::Namespace(_) => StatusCode::BAD_REQUEST,
            AppError::Query(QueryError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Query(_) => StatusCode::BAD_GATEWAY,
            AppError::Enqueue(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn handle_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<Response, AppError> {
    let owner_id = owner_id_from(&headers)?;
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query must not be empty".into()));
    }
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
    if top_k == 0 {
        return Err(AppError::Validation("topK must be greater than zero".into()));
    }

    let owner_type = match request.scope {
        QueryScope::User => OwnerType::Personal,
        QueryScope::Organization => OwnerType::Organization,
    };
    let namespace = resolve_namespace(owner_type, owner_id, request.organization_id.as_deref())?;

    let enhanced = enhance_query(&request.query);
    let grounded = state
        .rag
        .answer(&namespace, &enhanced, top_k, request.filter.as_ref())
        .await?;

    Ok(Json(json!({
        "namespace": namespace,
        "answer": grounded.answer,
        "sources": grounded.sources,
    }))
    .into_response())
}

async fn handle_enqueue(
    State(state): State<AppState>,
    Json(message): Json<IngestionMessage>,
) -> Result<Response, AppError> {
    if message.document_id.trim().is_empty() {
        return Err(AppError::Validation("documentId must not be empty".into()));
    }
    if message.owner_id.trim().is_empty() {
        return Err(AppError::Validation("ownerId must not be empty".into()));
    }

    state.publisher.publish(&message).await?;
    tracing::info!(document_id = %message.document_id, "Ingestion message enqueued");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "queued", "documentId": message.document_id })),
    )
        .into_response())
}

async fn handle_metrics(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.metrics.snapshot()))
}

async fn handle_dead_letters(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.dead_letters.snapshot().await))
}

fn owner_id_from(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get("x-owner-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation("x-owner-id header is required".into()))
}
