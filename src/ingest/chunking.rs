//! Token budgets and semantic chunking for oversized records.
//!
//! The provider chunks uploaded files on its own, but one JSON entry per record only stays
//! retrievable as a unit when the record fits a chunk. Records above the budget are split here:
//! `tiktoken-rs` counts tokens the way the chat model does, `semchunk-rs` picks semantic
//! boundaries, and an optional overlap repeats the tail of the previous chunk.

use anyhow::Error as TokenizerError;
use semchunk_rs::Chunker;
use std::sync::Arc;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};

use super::types::ChunkingError;

pub(crate) type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

const FALLBACK_ENCODING: &str = "o200k_base";

/// Token counter matching `model`, or a whitespace counter when no tokenizer loads.
pub(crate) fn token_counter_for(model: &str) -> TokenCounter {
    tiktoken_counter(model).unwrap_or_else(|error| {
        tracing::warn!(model, error = %error, "Tokenizer unavailable; counting whitespace tokens");
        whitespace_counter()
    })
}

fn tiktoken_counter(model: &str) -> Result<TokenCounter, ChunkingError> {
    let model = match model.trim() {
        "" => FALLBACK_ENCODING,
        trimmed => trimmed,
    };
    let encoding = load_encoding(model).map_err(|source| ChunkingError::Tokenizer {
        model: model.to_string(),
        source,
    })?;
    Ok(Arc::new(move |segment: &str| encoding.encode_ordinary(segment).len()))
}

/// Accepts model names (`gpt-4o`) as well as encoding names (`cl100k_base`).
fn load_encoding(name: &str) -> Result<CoreBPE, TokenizerError> {
    match name {
        "cl100k_base" => cl100k_base(),
        "o200k_base" => o200k_base(),
        "p50k_base" => p50k_base(),
        "p50k_edit" => p50k_edit(),
        "r50k_base" | "gpt2" => r50k_base(),
        model => get_bpe_from_model(model).or_else(|error| {
            tracing::debug!(model, error = %error, "Unknown tokenizer model; using {FALLBACK_ENCODING}");
            o200k_base()
        }),
    }
}

/// One token per whitespace-separated word; non-empty text always counts at least one.
pub(crate) fn whitespace_counter() -> TokenCounter {
    Arc::new(|segment: &str| match segment.split_whitespace().count() {
        0 if !segment.is_empty() => 1,
        words => words,
    })
}

/// Split `text` into chunks of at most `chunk_size` tokens, each after the first prefixed with
/// up to `overlap` tokens from the end of its predecessor.
pub(crate) fn split_by_tokens(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    counter: TokenCounter,
) -> Vec<String> {
    let semchunk_counter = counter.clone();
    let chunker = Chunker::new(
        chunk_size,
        Box::new(move |segment: &str| semchunk_counter.as_ref()(segment)),
    );
    let chunks = chunker.chunk(text);

    let overlap = overlap.min(chunk_size.saturating_sub(1));
    if overlap == 0 || chunks.len() < 2 {
        return chunks;
    }

    let mut overlapped = Vec::with_capacity(chunks.len());
    overlapped.extend(chunks.first().cloned());
    overlapped.extend(chunks.windows(2).map(|pair| {
        let tail = token_suffix(&pair[0], overlap, &counter);
        let separator = if tail.is_empty()
            || tail.ends_with(char::is_whitespace)
            || pair[1].starts_with(char::is_whitespace)
        {
            ""
        } else {
            " "
        };
        let combined = format!("{tail}{separator}{}", pair[1]);
        token_suffix(&combined, chunk_size, &counter).to_string()
    }));
    overlapped
}

/// Longest suffix of `text`, leading whitespace removed, that fits in `budget` tokens.
fn token_suffix<'a>(text: &'a str, budget: usize, counter: &TokenCounter) -> &'a str {
    if budget == 0 {
        return "";
    }
    text.char_indices()
        .map(|(offset, _)| text[offset..].trim_start())
        .find(|candidate| counter.as_ref()(candidate) <= budget)
        .unwrap_or("")
}
