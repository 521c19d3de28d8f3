//! Read-only access to the external document store.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Document record fields read from the external store.
///
/// Exactly one of `text_content`, `url`, or `file_key` is expected to be
/// populated, matching the document's declared content type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Human-readable document title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Inline text content for TEXT documents.
    #[serde(default)]
    pub text_content: Option<String>,
    /// Page URL for URL documents.
    #[serde(default)]
    pub url: Option<String>,
    /// Object storage key for FILE documents.
    #[serde(default)]
    pub file_key: Option<String>,
    /// Owning organization, when the document is organization-scoped.
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Identifier of the owning user.
    pub owner_id: String,
}

/// Errors raised while reading document records.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Document store responded with an unexpected status code.
    #[error("Unexpected document store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Interface for reading document metadata by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the record for `document_id`, or `None` when it does not exist.
    async fn fetch(&self, document_id: &str)
    -> Result<Option<DocumentMetadata>, DocumentStoreError>;
}

/// HTTP client reading document records from the store's REST surface.
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
}

impl HttpDocumentStore {
    /// Construct a client rooted at the given base URL.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn fetch(
        &self,
        document_id: &str,
    ) -> Result<Option<DocumentMetadata>, DocumentStoreError> {
        let url = format!("{}/documents/{document_id}", self.base_url);
        let response = self.client.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(Some(response.json().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(DocumentStoreError::UnexpectedStatus { status, body })
            }
        }
    }
}
