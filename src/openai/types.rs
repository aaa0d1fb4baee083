//! Shared types used by the provider client and its callers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with the provider API.
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with an unexpected status code.
    #[error("Unexpected provider response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Chat completion returned no message content.
    #[error("Chat completion returned no content")]
    EmptyCompletion,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions that frame the conversation.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

/// Single message sent to the chat completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: ChatRole,
    /// Message body.
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Vector store as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStore {
    /// Provider-assigned identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Processing status (`in_progress`, `completed`, ...).
    #[serde(default)]
    pub status: Option<String>,
}

/// Uploaded file descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    /// Provider-assigned identifier.
    pub id: String,
    /// Name the file was uploaded under.
    #[serde(default)]
    pub filename: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// File batch attaching uploaded files to a vector store.
#[derive(Debug, Clone, Deserialize)]
pub struct FileBatch {
    /// Provider-assigned identifier.
    pub id: String,
    /// Store the batch belongs to.
    #[serde(default)]
    pub vector_store_id: Option<String>,
    /// Processing status of the batch.
    #[serde(default)]
    pub status: Option<String>,
}

/// One scored hit returned by a vector store search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    /// File the matching chunk came from.
    pub file_id: String,
    /// Name of that file.
    #[serde(default)]
    pub filename: Option<String>,
    /// Relevance score reported by the provider.
    pub score: f32,
    /// Attributes attached to the file.
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
    /// Matching chunk content.
    #[serde(default)]
    pub content: Vec<SearchContent>,
}

impl SearchResult {
    /// Concatenate the text parts of the hit.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Content fragment of a search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchContent {
    /// Fragment type; `text` for everything this tool uploads.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Fragment text.
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) data: Vec<SearchResult>,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub(crate) choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub(crate) message: ChatChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub(crate) content: Option<String>,
}
