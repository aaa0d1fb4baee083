//! HTTP client wrapper for the provider's vector store and chat endpoints.

use crate::config::Config;
use crate::openai::types::{
    ChatCompletionResponse, ChatMessage, FileBatch, FileObject, OpenAiError, SearchResponse,
    SearchResult, VectorStore,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart};
use serde_json::{Map, Value, json};
use std::time::Duration;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Interface implemented by chat completion backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the conversation and return the first choice's message content.
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, OpenAiError>;
}

/// Lightweight HTTP client for provider operations.
pub struct OpenAiService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) max_retries: u32,
    pub(crate) initial_backoff: Duration,
}

impl OpenAiService {
    /// Construct a new client from an explicit configuration.
    pub fn from_config(config: &Config) -> Result<Self, OpenAiError> {
        let client = Client::builder().user_agent("rustykb/0.1").build()?;
        let base_url =
            normalize_base_url(&config.openai_base_url).map_err(OpenAiError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            model = %config.chat_model,
            max_retries = config.openai_max_retries,
            "Initialized provider HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.openai_api_key.clone(),
            model: config.chat_model.clone(),
            max_retries: config.openai_max_retries,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    /// Create a new vector store with descriptive metadata.
    pub async fn create_vector_store(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> Result<VectorStore, OpenAiError> {
        let body = json!({
            "name": name,
            "metadata": metadata,
        });
        let response = self
            .execute("create_vector_store", || {
                self.request(Method::POST, "vector_stores").json(&body)
            })
            .await?;
        let store: VectorStore = response.json().await?;
        tracing::debug!(store_id = %store.id, name, "Vector store created");
        Ok(store)
    }

    /// Upload a file for use by vector stores.
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        purpose: &str,
    ) -> Result<FileObject, OpenAiError> {
        let size = bytes.len();
        let response = self
            .execute("upload_file", || {
                let part = multipart::Part::bytes(bytes.clone()).file_name(file_name.to_string());
                let form = multipart::Form::new()
                    .text("purpose", purpose.to_string())
                    .part("file", part);
                self.request(Method::POST, "files").multipart(form)
            })
            .await?;
        let file: FileObject = response.json().await?;
        tracing::debug!(file_id = %file.id, file_name, bytes = size, "File uploaded");
        Ok(file)
    }

    /// Attach uploaded files to a vector store.
    pub async fn create_file_batch(
        &self,
        vector_store_id: &str,
        file_ids: &[String],
    ) -> Result<FileBatch, OpenAiError> {
        let body = json!({ "file_ids": file_ids });
        let path = format!("vector_stores/{vector_store_id}/file_batches");
        let response = self
            .execute("create_file_batch", || {
                self.request(Method::POST, &path).json(&body)
            })
            .await?;
        let batch: FileBatch = response.json().await?;
        tracing::debug!(
            store_id = vector_store_id,
            batch_id = %batch.id,
            files = file_ids.len(),
            "File batch created"
        );
        Ok(batch)
    }

    /// Run a semantic query against a vector store and return the scored hits.
    pub async fn search_vector_store(
        &self,
        vector_store_id: &str,
        query: &str,
        max_num_results: usize,
    ) -> Result<Vec<SearchResult>, OpenAiError> {
        let body = json!({
            "query": query,
            "max_num_results": max_num_results,
        });
        let path = format!("vector_stores/{vector_store_id}/search");
        let response = self
            .execute("search_vector_store", || {
                self.request(Method::POST, &path).json(&body)
            })
            .await?;
        let SearchResponse { data } = response.json().await?;
        tracing::debug!(
            store_id = vector_store_id,
            hits = data.len(),
            "Vector store search completed"
        );
        Ok(data)
    }

    /// Request a chat completion with the configured model.
    pub async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String, OpenAiError> {
        let body = json!({
            "model": self.model,
            "messages": messages,
        });
        let response = self
            .execute("chat_completion", || {
                self.request(Method::POST, "chat/completions").json(&body)
            })
            .await?;
        let payload: ChatCompletionResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(OpenAiError::EmptyCompletion)
    }

    /// Client against a mock server with no retries and a 1ms backoff.
    #[cfg(test)]
    pub(crate) fn for_tests(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent("rustykb-test")
                .build()
                .expect("client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: "sk-test".into(),
            model: "gpt-4o".into(),
            max_retries: 0,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
    }

    /// Send a request, retrying transient failures the way the provider's client library does.
    async fn execute<F>(&self, operation: &'static str, build: F) -> Result<Response, OpenAiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if attempt < self.max_retries && is_retryable_status(status) {
                        let delay = backoff_delay(self.initial_backoff, attempt);
                        tracing::warn!(
                            operation,
                            %status,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying provider request"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    let body = response.text().await.unwrap_or_default();
                    let error = OpenAiError::UnexpectedStatus { status, body };
                    tracing::error!(operation, error = %error, "Provider request failed");
                    return Err(error);
                }
                Err(error) => {
                    if attempt < self.max_retries && (error.is_connect() || error.is_timeout()) {
                        let delay = backoff_delay(self.initial_backoff, attempt);
                        tracing::warn!(
                            operation,
                            error = %error,
                            attempt = attempt + 1,
                            "Retrying provider request after transport error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    tracing::error!(operation, error = %error, "Provider request failed");
                    return Err(OpenAiError::Http(error));
                }
            }
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiService {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, OpenAiError> {
        self.chat_completion(messages).await
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT | StatusCode::TOO_MANY_REQUESTS
    ) || status.is_server_error()
}

fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    initial.saturating_mul(factor).min(MAX_BACKOFF)
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
