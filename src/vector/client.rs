//! HTTP client wrapper for the vector store.

use crate::config::Config;
use crate::vector::types::{
    PointInsert, QueryPoint, QueryResponse, QueryResponseResult, ScoredPoint, VectorError,
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// Lightweight HTTP client for vector store operations.
pub struct VectorClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) collection: String,
    pub(crate) api_key: Option<String>,
}

impl VectorClient {
    /// Construct a new client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, VectorError> {
        let client = Client::builder()
            .user_agent("docspace/0.1")
            .build()
            .map_err(VectorError::Http)?;

        let base_url =
            normalize_base_url(&config.vector_store_url).map_err(VectorError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            collection = %config.vector_collection_name,
            "Initialized vector store HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            collection: config.vector_collection_name.clone(),
            api_key: config.vector_store_api_key.clone(),
        })
    }

    /// Construct a client against an explicit endpoint and collection.
    pub fn for_endpoint(
        client: Client,
        base_url: impl Into<String>,
        collection: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            collection: collection.into(),
            api_key,
        }
    }

    /// Create the fragment collection when missing and ensure payload indexes.
    pub async fn ensure_collection(&self, vector_size: u64) -> Result<(), VectorError> {
        if !self.collection_exists().await? {
            tracing::debug!(collection = %self.collection, vector_size, "Creating collection");
            let body = json!({
                "vectors": {
                    "size": vector_size,
                    "distance": "Cosine"
                }
            });
            let response = self
                .request(Method::PUT, &format!("collections/{}", self.collection))?
                .json(&body)
                .send()
                .await?;
            self.ensure_success(response, || {
                tracing::debug!(collection = %self.collection, "Collection created");
            })
            .await?;
        }
        self.ensure_payload_indexes().await
    }

    /// Write a batch of prepared points as one logical upsert.
    ///
    /// Point ids are deterministic per fragment, so the write is idempotent:
    /// re-ingesting a document overwrites same-indexed fragments in place.
    pub async fn upsert_points(&self, points: Vec<PointInsert>) -> Result<(), VectorError> {
        if points.is_empty() {
            return Ok(());
        }

        let point_count = points.len();
        let serialized: Vec<_> = points
            .into_iter()
            .map(|point| {
                json!({
                    "id": point.id,
                    "vector": point.vector,
                    "payload": point.payload,
                })
            })
            .collect();

        let response = self
            .request(
                Method::PUT,
                &format!("collections/{}/points", self.collection),
            )?
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = %self.collection,
                points = point_count,
                "Points upserted"
            );
        })
        .await
    }

    /// Perform a similarity search restricted by the given filter.
    pub async fn search_points(
        &self,
        vector: Vec<f32>,
        filter: Value,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorError> {
        let body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
            "filter": filter,
        });

        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/query", self.collection),
            )?
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorError::UnexpectedStatus { status, body };
            tracing::error!(collection = %self.collection, error = %error, "Vector search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points } => points,
        };
        Ok(points.into_iter().map(into_scored_point).collect())
    }

    /// Ensure payload indexes exist for the fields every query filters on.
    async fn ensure_payload_indexes(&self) -> Result<(), VectorError> {
        let fields: [(&str, &str); 4] = [
            ("namespace", "keyword"),
            ("document_id", "keyword"),
            ("content_type", "keyword"),
            ("created_at", "keyword"),
        ];

        for (field, schema) in fields {
            let body = json!({
                "field_name": field,
                "field_schema": schema,
            });

            let response = self
                .request(
                    Method::PUT,
                    &format!("collections/{}/index", self.collection),
                )?
                .json(&body)
                .send()
                .await?;

            if response.status().is_success() || response.status() == StatusCode::CONFLICT {
                tracing::debug!(collection = %self.collection, field, "Payload index ensured");
            } else {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = VectorError::UnexpectedStatus { status, body };
                tracing::warn!(
                    collection = %self.collection,
                    field,
                    error = %error,
                    "Failed to ensure payload index"
                );
            }
        }

        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool, VectorError> {
        let response = self
            .request(Method::GET, &format!("collections/{}", self.collection))?
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = VectorError::UnexpectedStatus { status, body };
                tracing::error!(
                    collection = %self.collection,
                    error = %error,
                    "Collection existence check failed"
                );
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, VectorError> {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        Ok(req)
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), VectorError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Vector store request failed");
            Err(error)
        }
    }
}

fn into_scored_point(point: QueryPoint) -> ScoredPoint {
    ScoredPoint {
        id: stringify_point_id(point.id),
        score: point.score,
        payload: point.payload,
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

fn stringify_point_id(id: Value) -> String {
    match id {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
