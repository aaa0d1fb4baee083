//! Core data types and error definitions for the ingestion pipeline.

use crate::{extract::ExtractError, openai::OpenAiError};
use anyhow::Error as TokenizerError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning raw text into semantic chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible token budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer resources were unavailable for the configured model.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Model we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors emitted by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Office document could not be converted to text.
    #[error("Failed to extract document: {0}")]
    Extract(#[from] ExtractError),
    /// Translation through the provider failed.
    #[error("Failed to translate content: {0}")]
    Translation(#[from] OpenAiError),
    /// Chunking configuration was rejected.
    #[error("Failed to chunk content: {0}")]
    Chunking(#[from] ChunkingError),
    /// Document contained no text after extraction.
    #[error("Document {} contains no text", .path.display())]
    EmptyDocument {
        /// Offending document.
        path: PathBuf,
    },
    /// Reading or writing a records file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A JSON file could not be encoded or decoded.
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        /// File being accessed.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// One normalized unit of text ready to be uploaded to the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Normalized English text.
    pub content: String,
    /// Free-form metadata describing where the text came from.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Record {
    /// Build a record from content and metadata.
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Whether the record carries any non-whitespace text.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// String metadata value for `key`, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Tunables applied while ingesting sources.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Token budget of a single record.
    pub chunk_size: usize,
    /// Token overlap between consecutive chunks.
    pub chunk_overlap: usize,
    /// Model whose tokenizer measures the budget.
    pub model: String,
}

impl IngestSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            chunk_size: config.text_splitter_chunk_size,
            chunk_overlap: config.text_splitter_chunk_overlap,
            model: config.chat_model.clone(),
        }
    }
}
