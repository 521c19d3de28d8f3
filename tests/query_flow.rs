//! End-to-end query: HTTP request in, grounded and cited answer out.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use docspace::api::{AppState, router};
use docspace::embedding::HttpEmbeddingClient;
use docspace::generation::HttpGenerationClient;
use docspace::metrics::IngestionMetrics;
use docspace::queue::{DeadLetterQueue, channel_queue};
use docspace::rag::RagService;
use docspace::vector::VectorClient;
use http_body_util::BodyExt;
use httpmock::{Method::POST, MockServer};
use reqwest::Client;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app_for(
    embeddings: &MockServer,
    vectors: &MockServer,
    generation: &MockServer,
) -> axum::Router {
    let client = Client::new();
    let rag = Arc::new(RagService::new(
        Arc::new(HttpEmbeddingClient::new(
            client.clone(),
            embeddings.url("/embed"),
            None,
            2,
        )),
        Arc::new(VectorClient::for_endpoint(
            client.clone(),
            vectors.base_url(),
            "documents",
            None,
        )),
        Arc::new(HttpGenerationClient::new(
            client,
            generation.url("/chat/completions"),
            None,
            "gemma2-9b-it",
        )),
    ));
    let (publisher, _consumer) = channel_queue(4);
    router(AppState {
        rag,
        publisher,
        metrics: Arc::new(IngestionMetrics::new()),
        dead_letters: Arc::new(DeadLetterQueue::new(16)),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn schedule_question_is_enhanced_scoped_and_answered() {
    let embeddings = MockServer::start_async().await;
    let vectors = MockServer::start_async().await;
    let generation = MockServer::start_async().await;

    // The embedded text is the enhanced query: domain terms appended by the
    // schedule pass, date strings appended by the date pass.
    let embed = embeddings
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embed")
                .body_contains("any meetings tomorrow?")
                .body_contains("schedule meeting class event session agenda");
            then.status(200).json_body(json!([[0.1, 0.2]]));
        })
        .await;
    let search = vectors
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/documents/points/query")
                .body_contains("\"key\":\"namespace\"")
                .body_contains("\"value\":\"USER_u1\"")
                .body_contains("\"limit\":5");
            then.status(200).json_body(json!({
                "result": [
                    {
                        "id": "p1",
                        "score": 0.91,
                        "payload": { "text": "design review 28 august 2025 at 2pm", "title": "Calendar" }
                    },
                    {
                        "id": "p2",
                        "score": 0.84,
                        "payload": { "text": "sprint planning moved to thursday", "title": "Calendar" }
                    },
                    {
                        "id": "p3",
                        "score": 0.52,
                        "payload": { "text": "cafeteria menu for the week", "title": "Misc" }
                    }
                ]
            }));
        })
        .await;
    let chat = generation
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("[1] design review 28 august 2025 at 2pm")
                .body_contains("[2] sprint planning moved to thursday");
            then.status(200).json_body(json!({
                "choices": [
                    {
                        "message": {
                            "role": "assistant",
                            "content": "Yes, a design review at 2pm [1]."
                        }
                    }
                ]
            }));
        })
        .await;

    let app = app_for(&embeddings, &vectors, &generation);
    let response = app
        .oneshot(
            Request::post("/query")
                .header("content-type", "application/json")
                .header("x-owner-id", "u1")
                .body(Body::from(
                    r#"{"query":"any meetings tomorrow?","type":"USER"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    embed.assert();
    search.assert();
    chat.assert();

    let body = body_json(response).await;
    assert_eq!(body["namespace"], "USER_u1");
    assert_eq!(body["answer"], "Yes, a design review at 2pm [1].");

    let sources = body["sources"].as_array().unwrap();
    assert!(sources.len() <= 5);
    let ranks: Vec<u64> = sources
        .iter()
        .map(|source| source["rank"].as_u64().unwrap())
        .collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(sources[0]["metadata"]["title"], "Calendar");
}

#[tokio::test]
async fn organization_query_targets_the_organization_namespace() {
    let embeddings = MockServer::start_async().await;
    let vectors = MockServer::start_async().await;
    let generation = MockServer::start_async().await;

    embeddings
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(json!([[0.1, 0.2]]));
        })
        .await;
    let search = vectors
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/documents/points/query")
                .body_contains("\"value\":\"ORG_org-1\"");
            then.status(200).json_body(json!({ "result": [] }));
        })
        .await;
    generation
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "I do not know." } }
                ]
            }));
        })
        .await;

    let app = app_for(&embeddings, &vectors, &generation);
    let response = app
        .oneshot(
            Request::post("/query")
                .header("content-type", "application/json")
                .header("x-owner-id", "u1")
                .body(Body::from(
                    r#"{"query":"refund policy?","type":"ORGANIZATION","organizationId":"org-1"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    search.assert();
    let body = body_json(response).await;
    assert_eq!(body["namespace"], "ORG_org-1");
    assert_eq!(body["answer"], "I do not know.");
    assert!(body["sources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn top_k_and_metadata_filter_are_honored() {
    let embeddings = MockServer::start_async().await;
    let vectors = MockServer::start_async().await;
    let generation = MockServer::start_async().await;

    embeddings
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(json!([[0.1, 0.2]]));
        })
        .await;
    let search = vectors
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/documents/points/query")
                .body_contains("\"limit\":2")
                .body_contains("\"key\":\"content_type\"")
                .body_contains("\"value\":\"URL\"");
            then.status(200).json_body(json!({ "result": [] }));
        })
        .await;
    generation
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "I do not know." } }
                ]
            }));
        })
        .await;

    let app = app_for(&embeddings, &vectors, &generation);
    let response = app
        .oneshot(
            Request::post("/query")
                .header("content-type", "application/json")
                .header("x-owner-id", "u1")
                .body(Body::from(
                    r#"{"query":"linked pages?","type":"USER","topK":2,"filter":{"content_type":"URL"}}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    search.assert();
}
