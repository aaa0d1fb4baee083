//! Provider integration: vector stores, file uploads, semantic search, and chat completions.

pub mod client;
pub mod types;

pub use client::{ChatClient, OpenAiService};
pub use types::{
    ChatMessage, ChatRole, FileBatch, FileObject, OpenAiError, SearchContent, SearchResult,
    VectorStore,
};
