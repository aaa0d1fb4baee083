//! Splitting oversized records into budget-sized chunks.

use super::chunking::{TokenCounter, split_by_tokens, token_counter_for};
use super::types::{ChunkingError, Record};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Chunk text with associated hash.
#[derive(Debug, Clone)]
pub(crate) struct PreparedChunk {
    pub(crate) text: String,
    pub(crate) chunk_hash: String,
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Remove blank and duplicate chunks, keeping the first occurrence.
pub(crate) fn dedupe_chunks(chunks: Vec<String>) -> (Vec<PreparedChunk>, usize) {
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();
    let mut skipped = 0;

    for text in chunks {
        if text.trim().is_empty() {
            continue;
        }
        let hash = compute_chunk_hash(&text);
        if seen.insert(hash.clone()) {
            prepared.push(PreparedChunk {
                text,
                chunk_hash: hash,
            });
        } else {
            skipped += 1;
        }
    }

    (prepared, skipped)
}

/// Splits records whose content exceeds the token budget.
pub struct RecordSplitter {
    chunk_size: usize,
    overlap: usize,
    token_counter: TokenCounter,
}

impl RecordSplitter {
    /// Build a splitter measuring tokens with the tokenizer of `model`.
    pub fn new(chunk_size: usize, overlap: usize, model: &str) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        Ok(Self {
            chunk_size,
            overlap,
            token_counter: token_counter_for(model),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_counter(chunk_size: usize, overlap: usize, counter: TokenCounter) -> Self {
        Self {
            chunk_size,
            overlap,
            token_counter: counter,
        }
    }

    /// Return the record unchanged when it fits, otherwise one record per unique chunk.
    ///
    /// Chunk records copy the original metadata and add `chunk_index`, `chunk_count`, and
    /// `chunk_hash`.
    pub fn split(&self, record: Record) -> Vec<Record> {
        if self.token_counter.as_ref()(&record.content) <= self.chunk_size {
            return vec![record];
        }

        let chunks = split_by_tokens(
            &record.content,
            self.chunk_size,
            self.overlap,
            self.token_counter.clone(),
        );
        let (prepared, skipped_duplicates) = dedupe_chunks(chunks);
        let chunk_count = prepared.len();
        tracing::debug!(
            chunk_size = self.chunk_size,
            overlap = self.overlap,
            chunks = chunk_count,
            skipped_duplicates,
            "Split oversized record"
        );

        prepared
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let mut metadata = record.metadata.clone();
                metadata.insert("chunk_index".into(), Value::from(index));
                metadata.insert("chunk_count".into(), Value::from(chunk_count));
                metadata.insert("chunk_hash".into(), Value::String(chunk.chunk_hash));
                Record::new(chunk.text, metadata)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::chunking::whitespace_counter;
    use serde_json::{Map, json};

    #[test]
    fn dedupe_chunks_removes_duplicates_and_counts_skips() {
        let chunks = vec![
            "alpha".to_string(),
            "beta".to_string(),
            "alpha".to_string(),
            " ".to_string(),
        ];
        let (deduped, skipped) = dedupe_chunks(chunks);
        let texts: Vec<_> = deduped.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", "beta"]);
        assert_eq!(skipped, 1);
        assert_ne!(deduped[0].chunk_hash, deduped[1].chunk_hash);
    }

    #[test]
    fn chunk_hash_is_stable() {
        let h1 = compute_chunk_hash("Hello world");
        let h2 = compute_chunk_hash("Hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn small_records_pass_through_untouched() {
        let splitter = RecordSplitter::with_counter(10, 0, whitespace_counter());
        let mut metadata = Map::new();
        metadata.insert("file_name".into(), json!("manual.docx"));
        let record = Record::new("\nSheet: Rules\n\nshort text", metadata);

        let split = splitter.split(record.clone());
        assert_eq!(split, vec![record]);
    }

    #[test]
    fn large_records_gain_chunk_metadata() {
        let splitter = RecordSplitter::with_counter(2, 0, whitespace_counter());
        let mut metadata = Map::new();
        metadata.insert("file_name".into(), json!("manual.docx"));
        let record = Record::new("one two three four five", metadata);

        let split = splitter.split(record);
        let contents: Vec<_> = split.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["one two", "three four", "five"]);
        for (index, chunk) in split.iter().enumerate() {
            assert_eq!(chunk.metadata["file_name"], "manual.docx");
            assert_eq!(chunk.metadata["chunk_index"], json!(index));
            assert_eq!(chunk.metadata["chunk_count"], json!(3));
            assert!(chunk.metadata_str("chunk_hash").is_some());
        }
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert!(matches!(
            RecordSplitter::new(0, 0, "gpt-4o"),
            Err(ChunkingError::InvalidChunkSize)
        ));
    }
}
