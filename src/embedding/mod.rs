//! Embedding client abstraction and HTTP adapter.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with an unexpected status code.
    #[error("Unexpected embedding response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider returned a different number of vectors than inputs.
    #[error("Embedding count mismatch: sent {sent} texts, received {received} vectors")]
    CountMismatch {
        /// Number of texts submitted.
        sent: usize,
        /// Number of vectors received.
        received: usize,
    },
    /// Returned vector dimensionality does not match configuration.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension.
        expected: usize,
        /// Actual dimension produced by the provider.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied text.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// HTTP embedding client speaking the feature-extraction inference contract:
/// `POST {url}` with `{ "inputs": [...] }` returning a vector per input.
pub struct HttpEmbeddingClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    dimension: usize,
}

impl HttpEmbeddingClient {
    /// Construct a client for the given inference endpoint.
    pub fn new(
        client: Client,
        url: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let sent = texts.len();
        tracing::debug!(texts = sent, "Generating embeddings");

        let mut request = self.client.post(&self.url).json(&json!({ "inputs": texts }));
        if let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::UnexpectedStatus { status, body });
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        if vectors.len() != sent {
            return Err(EmbeddingError::CountMismatch {
                sent,
                received: vectors.len(),
            });
        }
        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    #[tokio::test]
    async fn embeds_batch_of_texts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embed")
                    .json_body(json!({ "inputs": ["alpha", "beta"] }));
                then.status(200)
                    .json_body(json!([[0.1, 0.2], [0.3, 0.4]]));
            })
            .await;

        let client = HttpEmbeddingClient::new(Client::new(), server.url("/embed"), None, 2);
        let vectors = client
            .embed(vec!["alpha".into(), "beta".into()])
            .await
            .unwrap();
        mock.assert();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(json!([[0.1, 0.2, 0.3]]));
            })
            .await;

        let client = HttpEmbeddingClient::new(Client::new(), server.url("/embed"), None, 2);
        let error = client.embed(vec!["alpha".into()]).await.unwrap_err();
        assert!(matches!(
            error,
            EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn surfaces_provider_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(503).body("overloaded");
            })
            .await;

        let client = HttpEmbeddingClient::new(Client::new(), server.url("/embed"), None, 2);
        let error = client.embed(vec!["alpha".into()]).await.unwrap_err();
        assert!(matches!(error, EmbeddingError::UnexpectedStatus { .. }));
    }
}
