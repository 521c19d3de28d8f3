//! Read-only access to the external object storage service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Errors raised while fetching stored binaries.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// No object exists under the given storage key.
    #[error("Object not found for key {0}")]
    NotFound(String),
    /// Storage service responded with an unexpected status code.
    #[error("Unexpected object store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Interface for reading stored file binaries by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Return the raw binary content stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
}

/// HTTP client reading objects from a bucket-style endpoint.
pub struct HttpObjectStore {
    client: Client,
    base_url: String,
}

impl HttpObjectStore {
    /// Construct a client rooted at the given base URL.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let url = format!("{}/{}", self.base_url, key.trim_start_matches('/'));
        let response = self.client.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(ObjectStoreError::NotFound(key.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ObjectStoreError::UnexpectedStatus { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    #[tokio::test]
    async fn fetches_object_bytes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/uploads/report.pdf");
                then.status(200).body(b"%PDF-stub");
            })
            .await;

        let store = HttpObjectStore::new(Client::new(), server.base_url());
        let bytes = store.get("uploads/report.pdf").await.unwrap();
        assert_eq!(bytes, b"%PDF-stub");
    }

    #[tokio::test]
    async fn maps_missing_key_to_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/uploads/missing.pdf");
                then.status(404);
            })
            .await;

        let store = HttpObjectStore::new(Client::new(), server.base_url());
        let error = store.get("uploads/missing.pdf").await.unwrap_err();
        assert!(matches!(error, ObjectStoreError::NotFound(_)));
    }
}
