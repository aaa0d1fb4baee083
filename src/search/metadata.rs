//! Recovering provenance from the raw text of a search hit.

use crate::ingest::{ChannelFamily, OFFICIAL_DOCUMENT_SOURCE};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static METADATA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""metadata":\s*(\{[^}]+\})"#).expect("metadata pattern is valid")
});
static THREAD_TS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""thread_ts":\s*"([^"]+)""#).expect("thread_ts pattern is valid")
});

/// Documents recognized by name when a hit carries no metadata.
const KNOWN_DOCUMENTS: [(&str, &str); 2] = [
    ("Reclaim Guideline", "Reclaim Guideline 2025.xlsx"),
    ("Customer Success Manual", "Customer Success Manual.docx"),
];

/// Provenance recovered from a hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitMetadata {
    /// Source label (`official_document` or a channel family).
    pub source: Option<String>,
    /// Originating document name.
    pub document_name: Option<String>,
    /// Slack thread timestamp.
    pub thread_ts: Option<String>,
}

/// Extract source, document name, and thread timestamp from hit content.
pub fn extract_metadata(content: &str) -> HitMetadata {
    let mut metadata = HitMetadata::default();

    if let Some(embedded) = embedded_metadata(content) {
        metadata.source = string_field(&embedded, "source");
        metadata.document_name = string_field(&embedded, "file_name").or_else(|| {
            string_field(&embedded, "file_path")
                .and_then(|path| path.rsplit('/').next().map(str::to_string))
        });
    }

    if metadata.source.is_none() && metadata.document_name.is_none() {
        if let Some((_, file_name)) = KNOWN_DOCUMENTS
            .iter()
            .find(|(marker, _)| content.contains(marker))
        {
            metadata.document_name = Some((*file_name).to_string());
            metadata.source = Some(OFFICIAL_DOCUMENT_SOURCE.to_string());
        }
    }

    if metadata.source.is_none() {
        metadata.source = ChannelFamily::find_in(content).map(|family| family.as_str().to_string());
    }

    metadata.thread_ts = THREAD_TS_PATTERN
        .captures(content)
        .map(|captures| captures[1].to_string());
    metadata
}

/// Permalink to a Slack thread, when the workspace is known and the source is a channel family.
pub fn slack_link(workspace_url: Option<&str>, thread_ts: &str, source: Option<&str>) -> Option<String> {
    let workspace = workspace_url?.trim_end_matches('/');
    let channel = source.and_then(ChannelFamily::parse)?;
    if workspace.is_empty() || thread_ts.is_empty() {
        return None;
    }
    Some(format!(
        "{workspace}/archives/{}/p{}",
        channel.as_str(),
        thread_ts.replace('.', "")
    ))
}

fn embedded_metadata(content: &str) -> Option<Map<String, Value>> {
    let raw = METADATA_PATTERN.captures(content)?.get(1)?.as_str();
    match serde_json::from_str(raw) {
        Ok(map) => Some(map),
        Err(error) => {
            tracing::trace!(error = %error, "Ignoring unparsable embedded metadata");
            None
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
