use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docspace pipeline.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the vector store that holds fragment embeddings.
    pub vector_store_url: String,
    /// Name of the vector store collection used for document fragments.
    pub vector_collection_name: String,
    /// Optional API key required to access the vector store.
    pub vector_store_api_key: Option<String>,
    /// Endpoint of the embedding inference service.
    pub embedding_url: String,
    /// Optional bearer token for the embedding service.
    pub embedding_api_key: Option<String>,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Endpoint of the chat-completion service used for grounded answers.
    pub generation_url: String,
    /// Optional bearer token for the generation service.
    pub generation_api_key: Option<String>,
    /// Generation model identifier.
    pub generation_model: String,
    /// Base URL of the external document store read API.
    pub document_store_url: String,
    /// Base URL of the object storage service holding uploaded files.
    pub object_store_url: String,
    /// Optional override for the fragment size in characters.
    pub chunk_size: Option<usize>,
    /// Optional override for the fragment overlap in characters.
    pub chunk_overlap: Option<usize>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            vector_store_url: load_env("VECTOR_STORE_URL")?,
            vector_collection_name: load_env_optional("VECTOR_COLLECTION_NAME")
                .unwrap_or_else(|| "documents".to_string()),
            vector_store_api_key: load_env_optional("VECTOR_STORE_API_KEY"),
            embedding_url: load_env("EMBEDDING_URL")?,
            embedding_api_key: load_env_optional("EMBEDDING_API_KEY"),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| "sentence-transformers/all-MiniLM-L6-v2".to_string()),
            embedding_dimension: load_env_optional("EMBEDDING_DIMENSION")
                .unwrap_or_else(|| "384".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            generation_url: load_env("GENERATION_URL")?,
            generation_api_key: load_env_optional("GENERATION_API_KEY"),
            generation_model: load_env_optional("GENERATION_MODEL")
                .unwrap_or_else(|| "gemma2-9b-it".to_string()),
            document_store_url: load_env("DOCUMENT_STORE_URL")?,
            object_store_url: load_env("OBJECT_STORE_URL")?,
            chunk_size: parse_optional("CHUNK_SIZE")?,
            chunk_overlap: parse_optional("CHUNK_OVERLAP")?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional(key: &str) -> Result<Option<usize>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        vector_store_url = %config.vector_store_url,
        collection = %config.vector_collection_name,
        embedding_model = %config.embedding_model,
        generation_model = %config.generation_model,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
