//! Retrieval-generation orchestrator producing grounded, cited answers.
//!
//! The service embeds the (already enhanced) query, searches the caller's
//! namespace, renders the hits into a numbered context block, and asks the
//! generation model to answer strictly from that context. Source fragments
//! are returned alongside the answer so callers can verify citations.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::embedding::{EmbeddingClient, EmbeddingError};
use crate::generation::{GenerationClient, GenerationError};
use crate::vector::{VectorClient, VectorError, build_query_filter};

/// Default number of fragments retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

const GROUNDING_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer strictly based on the \
provided context. If the context does not contain the answer, say you do not know. Cite the \
sources you used with bracketed numbers like [1], [2] matching the numbered context entries.";

/// Errors raised while retrieving candidate fragments.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Query embedding failed.
    #[error("Failed to embed query: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Vector store search failed.
    #[error("Vector search failed: {0}")]
    Vector(#[from] VectorError),
    /// Embedding provider returned no vector for the query.
    #[error("Embedding provider returned no vector for the query")]
    EmptyEmbedding,
}

/// Errors terminating a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Query input was malformed or incomplete.
    #[error("Invalid query: {0}")]
    Validation(String),
    /// Candidate retrieval failed.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    /// Answer generation failed.
    #[error("Failed to generate answer: {0}")]
    Generation(#[from] GenerationError),
}

/// One retrieved fragment, numbered by similarity rank.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedFragment {
    /// One-based similarity rank; matches the citation numbers in the answer.
    pub rank: usize,
    /// Fragment text supplied to the model as context.
    pub text: String,
    /// Fragment metadata minus the text itself.
    pub metadata: Map<String, Value>,
}

/// A generated answer plus the fragments it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct GroundedAnswer {
    /// Model-generated answer text.
    pub answer: String,
    /// Fragments supplied as context, in rank order.
    pub sources: Vec<RetrievedFragment>,
}

/// Query-side service: embed, retrieve, and generate.
pub struct RagService {
    embeddings: Arc<dyn EmbeddingClient>,
    vectors: Arc<VectorClient>,
    generation: Arc<dyn GenerationClient>,
}

impl RagService {
    /// Assemble the service from its collaborators.
    pub fn new(
        embeddings: Arc<dyn EmbeddingClient>,
        vectors: Arc<VectorClient>,
        generation: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            embeddings,
            vectors,
            generation,
        }
    }

    /// Answer a question from fragments in one namespace.
    ///
    /// An empty result set still goes through generation: the model sees an
    /// empty context and says it does not know, which keeps the "no data"
    /// answer honest instead of hard-coded.
    pub async fn answer(
        &self,
        namespace: &str,
        query: &str,
        top_k: usize,
        filter: Option<&Map<String, Value>>,
    ) -> Result<GroundedAnswer, QueryError> {
        let sources = self.retrieve(namespace, query, top_k, filter).await?;
        tracing::debug!(
            namespace,
            candidates = sources.len(),
            "Retrieved context fragments"
        );

        let context = render_context(&sources);
        let user_prompt = format!("Question: {query}\n\nContext:\n{context}");
        let answer = self
            .generation
            .generate(GROUNDING_SYSTEM_PROMPT, &user_prompt)
            .await?;

        tracing::info!(namespace, sources = sources.len(), "Answered query");
        Ok(GroundedAnswer { answer, sources })
    }

    async fn retrieve(
        &self,
        namespace: &str,
        query: &str,
        top_k: usize,
        filter: Option<&Map<String, Value>>,
    ) -> Result<Vec<RetrievedFragment>, RetrievalError> {
        let mut vectors = self.embeddings.embed(vec![query.to_string()]).await?;
        let vector = match vectors.pop() {
            Some(vector) if !vector.is_empty() => vector,
            _ => return Err(RetrievalError::EmptyEmbedding),
        };

        let filter = build_query_filter(namespace, filter);
        let hits = self.vectors.search_points(vector, filter, top_k).await?;

        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(index, hit)| {
                let mut metadata = hit.payload.unwrap_or_default();
                let text = match metadata.remove("text") {
                    Some(Value::String(text)) => text,
                    _ => String::new(),
                };
                RetrievedFragment {
                    rank: index + 1,
                    text,
                    metadata,
                }
            })
            .collect())
    }
}

/// Render retrieved fragments as a numbered context block.
fn render_context(sources: &[RetrievedFragment]) -> String {
    sources
        .iter()
        .map(|source| format!("[{}] {}", source.rank, source.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
