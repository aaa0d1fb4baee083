//! Ingestion pipeline: documents and Slack exports to translated, chunked records.

mod chunking;
mod mappers;
mod records;
pub mod slack;
mod service;
pub mod types;

pub use mappers::{RecordSplitter, compute_chunk_hash};
pub use records::{load_records, save_records};
pub use service::{IngestService, OFFICIAL_DOCUMENT_SOURCE};
pub use slack::{ChannelFamily, DEFAULT_CHANNELS, SlackMessage};
pub use types::{ChunkingError, IngestError, IngestSettings, Record};
