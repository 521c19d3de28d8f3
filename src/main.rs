use std::sync::Arc;

use docspace::documents::HttpDocumentStore;
use docspace::embedding::HttpEmbeddingClient;
use docspace::extract::{Extractors, PdfExtractor, UrlExtractor};
use docspace::generation::HttpGenerationClient;
use docspace::metrics::IngestionMetrics;
use docspace::objects::HttpObjectStore;
use docspace::processing::IngestionService;
use docspace::queue::{DeadLetterQueue, Dispatcher, channel_queue};
use docspace::rag::RagService;
use docspace::vector::VectorClient;
use docspace::{api, config, logging};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();
    let config = config::get_config();

    let client = reqwest::Client::builder()
        .user_agent("docspace/0.1")
        .build()
        .expect("Failed to build HTTP client");

    let vectors = Arc::new(VectorClient::new(config).expect("Failed to build vector client"));
    vectors
        .ensure_collection(config.embedding_dimension as u64)
        .await
        .expect("Failed to prepare vector collection");

    let embeddings: Arc<dyn docspace::embedding::EmbeddingClient> = Arc::new(HttpEmbeddingClient::new(
        client.clone(),
        config.embedding_url.clone(),
        config.embedding_api_key.clone(),
        config.embedding_dimension,
    ));
    let generation = Arc::new(HttpGenerationClient::new(
        client.clone(),
        config.generation_url.clone(),
        config.generation_api_key.clone(),
        config.generation_model.clone(),
    ));
    let documents = Arc::new(HttpDocumentStore::new(
        client.clone(),
        config.document_store_url.clone(),
    ));
    let objects = Arc::new(HttpObjectStore::new(
        client.clone(),
        config.object_store_url.clone(),
    ));

    let metrics = Arc::new(IngestionMetrics::new());
    let service = Arc::new(IngestionService::new(
        documents,
        Extractors::new(UrlExtractor::new(client.clone()), PdfExtractor::new(objects)),
        Arc::clone(&embeddings),
        Arc::clone(&vectors),
        Arc::clone(&metrics),
        config.chunk_size,
        config.chunk_overlap,
    ));

    let (publisher, consumer) = channel_queue(64);
    let dead_letters = Arc::new(DeadLetterQueue::new(256));
    let dispatcher = Dispatcher::new(service, Arc::clone(&metrics), Arc::clone(&dead_letters));
    tokio::spawn(async move { dispatcher.run(consumer).await });

    let rag = Arc::new(RagService::new(embeddings, vectors, generation));
    let app = api::router(api::AppState {
        rag,
        publisher,
        metrics,
        dead_letters,
    });

    let (listener, port) = bind_listener().await.expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4200..=4299;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4200-4299",
    ))
}
