//! Slack channel export handling.
//!
//! A Slack export holds one directory per channel with one JSON array of messages per day.
//! Messages become records one by one, or merged per thread when requested.

use super::types::{IngestError, Record};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use walkdir::WalkDir;

/// Channels read when no explicit list is given.
pub const DEFAULT_CHANNELS: [&str; 3] = ["product-changes", "help", "customer-success"];

const IGNORED_EXPORT_FILES: [&str; 1] = ["canvas_in_the_conversation.json"];

/// Channel families recognized for source weighting, in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFamily {
    /// Announcements of product changes.
    ProductChanges,
    /// Help requests.
    Help,
    /// Customer success discussions.
    CustomerSuccess,
}

impl ChannelFamily {
    const ALL: [Self; 3] = [Self::ProductChanges, Self::Help, Self::CustomerSuccess];

    /// Identifier stored in record metadata.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductChanges => "product-changes",
            Self::Help => "help",
            Self::CustomerSuccess => "customer-success",
        }
    }

    /// First family whose identifier occurs in `text`.
    pub fn find_in(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|family| text.contains(family.as_str()))
    }

    /// Family with exactly this identifier.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == value)
    }
}

/// Subset of a Slack message relevant to the knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SlackMessage {
    /// Message text (mrkdwn).
    #[serde(default)]
    pub text: Option<String>,
    /// Message timestamp, also its identifier.
    #[serde(default)]
    pub ts: Option<String>,
    /// Parent thread timestamp for replies.
    #[serde(default)]
    pub thread_ts: Option<String>,
    /// Author id.
    #[serde(default)]
    pub user: Option<String>,
    /// Channel the message was exported from; filled in while loading.
    #[serde(default)]
    pub channel: Option<String>,
}

impl SlackMessage {
    /// Message text when it is non-blank.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.trim().is_empty())
    }
}

/// Build record metadata for a message whose content has already been normalized.
pub(crate) fn message_metadata(message: &SlackMessage, original_language: &str) -> Map<String, Value> {
    let channel = message.channel.clone().unwrap_or_default();
    let timestamp = message.ts.clone().unwrap_or_default();
    let thread_ts = message.thread_ts.clone().unwrap_or_else(|| timestamp.clone());

    let mut metadata = Map::new();
    metadata.insert("channel".into(), Value::String(channel.clone()));
    if let Some(date) = format_slack_ts(&timestamp) {
        metadata.insert("date".into(), Value::String(date));
    }
    metadata.insert("timestamp".into(), Value::String(timestamp));
    metadata.insert("thread_ts".into(), Value::String(thread_ts));
    metadata.insert(
        "user".into(),
        Value::String(message.user.clone().unwrap_or_default()),
    );
    metadata.insert(
        "original_language".into(),
        Value::String(original_language.to_string()),
    );
    if let Some(family) = ChannelFamily::find_in(&channel) {
        metadata.insert("source".into(), Value::String(family.as_str().to_string()));
    }
    metadata
}

/// RFC 3339 UTC date of a Slack `ts` such as `1700000000.000100`.
fn format_slack_ts(ts: &str) -> Option<String> {
    let seconds: i64 = ts.split('.').next()?.parse().ok()?;
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

/// Load every message exported for `channel` under `root`, tagging each with the channel name.
///
/// Returns `Ok(None)` when the channel directory does not exist. Files that cannot be read or
/// parsed are logged and reported in the second element of the tuple.
pub fn load_channel_messages(
    root: &Path,
    channel: &str,
) -> Result<Option<(Vec<SlackMessage>, Vec<PathBuf>)>, IngestError> {
    let directory = root.join(channel);
    if !directory.is_dir() {
        tracing::warn!(channel, path = %directory.display(), "Channel directory not found");
        return Ok(None);
    }

    let mut messages = Vec::new();
    let mut failed = Vec::new();
    let entries = WalkDir::new(&directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in entries {
        let entry = entry.map_err(|error| IngestError::Io {
            path: directory.clone(),
            source: error.into(),
        })?;
        let path = entry.path();
        if !is_export_file(path) {
            continue;
        }
        match read_export_file(path) {
            Ok(batch) => {
                tracing::debug!(channel, file = %path.display(), messages = batch.len(), "Loaded export file");
                messages.extend(batch.into_iter().map(|mut message| {
                    message.channel = Some(channel.to_string());
                    message
                }));
            }
            Err(error) => {
                tracing::warn!(channel, file = %path.display(), error = %error, "Skipping export file");
                failed.push(path.to_path_buf());
            }
        }
    }

    Ok(Some((messages, failed)))
}

fn is_export_file(path: &Path) -> bool {
    let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
    let ignored = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| IGNORED_EXPORT_FILES.contains(&name))
        .unwrap_or(false);
    path.is_file() && is_json && !ignored
}

/// Parse an export file, keeping only entries that are message objects.
pub(crate) fn read_export_file(path: &Path) -> Result<Vec<SlackMessage>, IngestError> {
    let raw = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<Value> = serde_json::from_str(&raw).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let messages = entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| match serde_json::from_value::<SlackMessage>(entry) {
            Ok(message) => Some(message),
            Err(error) => {
                tracing::debug!(file = %path.display(), error = %error, "Skipping malformed message");
                None
            }
        })
        .collect();
    Ok(messages)
}

/// Merge per-message records into one record per thread, in order of first appearance.
pub fn group_by_thread(records: Vec<Record>) -> Vec<Record> {
    struct Thread {
        thread_ts: String,
        timestamp: String,
        source: Option<String>,
        lines: Vec<String>,
        participants: BTreeSet<String>,
    }

    let mut threads: Vec<Thread> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for record in records {
        let thread_ts = record.metadata_str("thread_ts").unwrap_or_default().to_string();
        let user = record.metadata_str("user").unwrap_or_default().to_string();
        let line = format!("{user}: {}", record.content);

        match positions.get(&thread_ts).map(|&idx| &mut threads[idx]) {
            Some(thread) => {
                thread.lines.push(line);
                thread.participants.insert(user);
            }
            None => {
                positions.insert(thread_ts.clone(), threads.len());
                threads.push(Thread {
                    timestamp: record.metadata_str("timestamp").unwrap_or_default().to_string(),
                    source: record.metadata_str("source").map(str::to_string),
                    thread_ts,
                    lines: vec![line],
                    participants: BTreeSet::from([user]),
                });
            }
        }
    }

    threads
        .into_iter()
        .map(|thread| {
            let mut metadata = Map::new();
            metadata.insert("thread_ts".into(), Value::String(thread.thread_ts));
            metadata.insert("timestamp".into(), Value::String(thread.timestamp));
            metadata.insert(
                "participants".into(),
                Value::Array(
                    thread
                        .participants
                        .into_iter()
                        .map(Value::String)
                        .collect(),
                ),
            );
            metadata.insert("message_count".into(), Value::from(thread.lines.len()));
            if let Some(source) = thread.source {
                metadata.insert("source".into(), Value::String(source));
            }
            Record::new(thread.lines.join("\n"), metadata)
        })
        .collect()
}
