use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
const DEFAULT_VECTOR_STORE_NAME: &str = "customer-success-knowledge";
const DEFAULT_VECTOR_STORE_ID_FILE: &str = "vector_store_id.txt";
const DEFAULT_SEARCH_MAX_RESULTS: usize = 30;
const DEFAULT_SEARCH_CONTEXT_LIMIT: usize = 8;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_CHUNK_SIZE: usize = 800;

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

/// Runtime configuration for the knowledge base tooling.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key sent as a bearer token to the provider.
    pub openai_api_key: String,
    /// Base URL of the provider REST API (including the `/v1` prefix).
    pub openai_base_url: String,
    /// Chat model used for translation, query analysis, and answers.
    pub chat_model: String,
    /// Display name given to newly created vector stores.
    pub vector_store_name: String,
    /// File holding the identifier of the active vector store.
    pub vector_store_id_file: PathBuf,
    /// Number of hits requested from the vector store per question.
    pub search_max_results: usize,
    /// Number of ranked hits passed on to answer generation.
    pub search_context_limit: usize,
    /// Additional attempts made for transient provider failures.
    pub openai_max_retries: u32,
    /// Token budget of a single uploaded record.
    pub text_splitter_chunk_size: usize,
    /// Token overlap between consecutive chunks of one record.
    pub text_splitter_chunk_overlap: usize,
    /// Slack workspace root used to build thread permalinks.
    pub slack_workspace_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: load_env("OPENAI_API_KEY")?,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            chat_model: load_env_optional("CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            vector_store_name: load_env_optional("VECTOR_STORE_NAME")
                .unwrap_or_else(|| DEFAULT_VECTOR_STORE_NAME.to_string()),
            vector_store_id_file: load_env_optional("VECTOR_STORE_ID_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VECTOR_STORE_ID_FILE)),
            search_max_results: parse_optional("SEARCH_MAX_RESULTS")?
                .unwrap_or(DEFAULT_SEARCH_MAX_RESULTS),
            search_context_limit: parse_optional("SEARCH_CONTEXT_LIMIT")?
                .unwrap_or(DEFAULT_SEARCH_CONTEXT_LIMIT),
            openai_max_retries: parse_optional("OPENAI_MAX_RETRIES")?
                .unwrap_or(DEFAULT_MAX_RETRIES),
            text_splitter_chunk_size: parse_optional("TEXT_SPLITTER_CHUNK_SIZE")?
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            text_splitter_chunk_overlap: parse_optional("TEXT_SPLITTER_CHUNK_OVERLAP")?
                .unwrap_or(0),
            slack_workspace_url: load_env_optional("SLACK_WORKSPACE_URL"),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
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
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    let config = Config::from_env()?;
    tracing::debug!(
        base_url = %config.openai_base_url,
        model = %config.chat_model,
        store_id_file = %config.vector_store_id_file.display(),
        max_results = config.search_max_results,
        context_limit = config.search_context_limit,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
