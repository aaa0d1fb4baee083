//! Errors and payload types for vector store uploads.

use crate::{ingest::IngestError, openai::OpenAiError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a knowledge base.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Every candidate record was blank.
    #[error("no records with content to upload")]
    NoRecords,
    /// A processed records file could not be loaded.
    #[error(transparent)]
    Records(#[from] IngestError),
    /// The provider rejected a request.
    #[error("Provider request failed: {0}")]
    Provider(#[from] OpenAiError),
    /// The upload payload could not be encoded.
    #[error("Failed to encode upload payload: {0}")]
    Encode(#[source] serde_json::Error),
    /// The store id file could not be read or written.
    #[error("I/O error on store id file {}: {source}", .path.display())]
    StoreIdIo {
        /// Store id file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The store id file exists but holds no id.
    #[error("store id file {} is empty", .path.display())]
    EmptyStoreId {
        /// Store id file.
        path: PathBuf,
    },
}

/// One entry of the uploaded JSON file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadEntry<'a> {
    /// Record content.
    pub text: &'a str,
    /// Record metadata, unchanged.
    pub metadata: &'a Map<String, Value>,
}
