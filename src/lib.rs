#![deny(missing_docs)]

//! Core library for the rustykb customer success knowledge base.

/// Environment-driven configuration management.
pub mod config;
/// Office document text extraction.
pub mod extract;
/// Document and Slack export ingestion.
pub mod ingest;
/// Language detection, translation, and the company glossary.
pub mod language;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline metrics helpers.
pub mod metrics;
/// Provider HTTP client for vector stores and chat completions.
pub mod openai;
/// Question answering over the vector store.
pub mod search;
/// Vector store creation and upload.
pub mod upload;
