use crate::{
    ingest::{Record, load_records},
    metrics::{KnowledgeMetrics, MetricsSnapshot},
    openai::{FileBatch, OpenAiService, VectorStore},
    upload::types::{UploadEntry, UploadError},
};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STORE_DESCRIPTION: &str =
    "Customer Success knowledge base from Slack conversations and documents";
const STORE_SOURCE: &str = "slack_export_and_documents";
const STORE_TYPE: &str = "customer_support";
const UPLOAD_PURPOSE: &str = "assistants";

/// Concatenate the records of every file in `paths` that exists, in order.
pub fn load_processed_data(paths: &[PathBuf]) -> Result<Vec<Record>, UploadError> {
    let mut records = Vec::new();
    for path in paths {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Records file not found, skipping");
            continue;
        }
        let loaded = load_records(path)?;
        tracing::info!(path = %path.display(), records = loaded.len(), "Loaded records");
        records.extend(loaded);
    }
    Ok(records)
}

/// Map records to upload entries, dropping the ones without content.
pub fn build_upload_payload(records: &[Record]) -> Result<Vec<UploadEntry<'_>>, UploadError> {
    let entries: Vec<_> = records
        .iter()
        .filter(|record| record.has_content())
        .map(|record| UploadEntry {
            text: &record.content,
            metadata: &record.metadata,
        })
        .collect();
    let dropped = records.len() - entries.len();
    if dropped > 0 {
        tracing::warn!(dropped, "Dropped records without content");
    }
    if entries.is_empty() {
        return Err(UploadError::NoRecords);
    }
    Ok(entries)
}

/// Persist the vector store id as plain text.
pub fn save_store_id(path: &Path, store_id: &str) -> Result<(), UploadError> {
    fs::write(path, store_id).map_err(|source| UploadError::StoreIdIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a previously saved vector store id.
pub fn load_store_id(path: &Path) -> Result<String, UploadError> {
    let raw = fs::read_to_string(path).map_err(|source| UploadError::StoreIdIo {
        path: path.to_path_buf(),
        source,
    })?;
    let id = raw.trim();
    if id.is_empty() {
        return Err(UploadError::EmptyStoreId {
            path: path.to_path_buf(),
        });
    }
    Ok(id.to_string())
}

/// Creates vector stores and fills them with processed records.
pub struct UploadService {
    openai: Arc<OpenAiService>,
    metrics: Arc<KnowledgeMetrics>,
}

impl UploadService {
    /// Build an upload service over a provider client.
    pub fn new(openai: Arc<OpenAiService>) -> Self {
        Self {
            openai,
            metrics: Arc::new(KnowledgeMetrics::new()),
        }
    }

    /// Create an empty vector store tagged with the knowledge base metadata.
    pub async fn create_store(&self, name: &str) -> Result<VectorStore, UploadError> {
        let store = self
            .openai
            .create_vector_store(name, store_metadata())
            .await?;
        tracing::info!(store_id = %store.id, name, "Created vector store");
        Ok(store)
    }

    /// Upload records as one JSON file and attach it to the store.
    pub async fn upload_records(
        &self,
        store_id: &str,
        records: &[Record],
    ) -> Result<FileBatch, UploadError> {
        let entries = build_upload_payload(records)?;
        let bytes = serde_json::to_vec_pretty(&entries).map_err(UploadError::Encode)?;
        let file_name = format!("rustykb-{}.json", uuid::Uuid::new_v4());

        let file = self
            .openai
            .upload_file(&file_name, bytes, UPLOAD_PURPOSE)
            .await?;
        let batch = self
            .openai
            .create_file_batch(store_id, std::slice::from_ref(&file.id))
            .await?;
        self.metrics.record_upload(entries.len() as u64);
        tracing::info!(
            store_id,
            file_id = %file.id,
            batch_id = %batch.id,
            records = entries.len(),
            "Uploaded records"
        );
        Ok(batch)
    }

    /// Create a store, upload the records, and save the store id to `id_path`.
    ///
    /// Records are validated before the store is created so an empty upload leaves no store behind.
    pub async fn build_knowledge_base(
        &self,
        name: &str,
        records: &[Record],
        id_path: &Path,
    ) -> Result<(VectorStore, FileBatch), UploadError> {
        build_upload_payload(records)?;
        let store = self.create_store(name).await?;
        let batch = self.upload_records(&store.id, records).await?;
        save_store_id(id_path, &store.id)?;
        tracing::info!(path = %id_path.display(), "Saved vector store id");
        Ok((store, batch))
    }

    /// Return the current upload metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn store_metadata() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("description".into(), Value::from(STORE_DESCRIPTION));
    metadata.insert("source".into(), Value::from(STORE_SOURCE));
    metadata.insert("type".into(), Value::from(STORE_TYPE));
    metadata
}
