//! Ingestion service coordinating extraction, translation, and chunking.

use crate::{
    extract::{self, ExtractedDocument, FileType},
    ingest::{
        mappers::RecordSplitter,
        slack::{self, SlackMessage},
        types::{IngestError, IngestSettings, Record},
    },
    language::{Glossary, Language, detect_language, translate_text},
    metrics::{KnowledgeMetrics, MetricsSnapshot},
    openai::ChatClient,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source label stored on every record produced from an office document.
pub const OFFICIAL_DOCUMENT_SOURCE: &str = "official_document";

/// Turns office documents and Slack exports into English records ready for upload.
///
/// The service owns the chat client used for translation and the metrics registry; construct it
/// once per command and share it by reference.
pub struct IngestService {
    chat: Arc<dyn ChatClient>,
    glossary: Glossary,
    splitter: RecordSplitter,
    metrics: Arc<KnowledgeMetrics>,
}

impl IngestService {
    /// Build a new ingestion service.
    pub fn new(
        chat: Arc<dyn ChatClient>,
        settings: &IngestSettings,
        glossary: Glossary,
    ) -> Result<Self, IngestError> {
        let splitter =
            RecordSplitter::new(settings.chunk_size, settings.chunk_overlap, &settings.model)?;
        tracing::debug!(
            chunk_size = settings.chunk_size,
            overlap = settings.chunk_overlap,
            model = %settings.model,
            "Ingest service ready"
        );
        Ok(Self {
            chat,
            glossary,
            splitter,
            metrics: Arc::new(KnowledgeMetrics::new()),
        })
    }

    /// Convert a single office document into one or more records.
    pub async fn process_document(&self, path: &Path) -> Result<Vec<Record>, IngestError> {
        let document = extract::extract_file(path)?;
        if document.text.trim().is_empty() {
            return Err(IngestError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }

        let language = detect_language(&document.text);
        let content = self.to_english(&document.text, language).await?;
        let record = Record::new(content, document_metadata(&document, language));
        let records = self.splitter.split(record);

        self.metrics.record_source(records.len() as u64);
        tracing::info!(
            file = %path.display(),
            file_type = document.file_type.as_str(),
            language = %language,
            records = records.len(),
            "Processed document"
        );
        Ok(records)
    }

    /// Convert several documents, logging and skipping the ones that fail.
    pub async fn process_documents(&self, paths: &[PathBuf]) -> Vec<Record> {
        let mut records = Vec::new();
        for path in paths {
            match self.process_document(path).await {
                Ok(processed) => records.extend(processed),
                Err(error) => {
                    self.metrics.record_skipped_file();
                    tracing::error!(file = %path.display(), error = %error, "Failed to process document");
                }
            }
        }
        records
    }

    /// Convert a single Slack message; messages without text produce nothing.
    pub async fn process_message(
        &self,
        message: &SlackMessage,
    ) -> Result<Option<Record>, IngestError> {
        let Some(text) = message.text() else {
            return Ok(None);
        };

        let language = detect_language(text);
        let content = self.to_english(text, language).await?;
        let metadata = slack::message_metadata(message, language.name());
        self.metrics.record_source(1);
        Ok(Some(Record::new(content, metadata)))
    }

    /// Convert the exported messages of every channel under `root`.
    ///
    /// Missing channel directories and unreadable export files are logged and skipped;
    /// translation failures abort the run.
    pub async fn process_conversations(
        &self,
        root: &Path,
        channels: &[String],
        group_threads: bool,
    ) -> Result<Vec<Record>, IngestError> {
        let mut records = Vec::new();
        for channel in channels {
            let Some((messages, failed)) = slack::load_channel_messages(root, channel)? else {
                continue;
            };
            for _ in &failed {
                self.metrics.record_skipped_file();
            }

            let mut channel_records = Vec::new();
            for message in &messages {
                if let Some(record) = self.process_message(message).await? {
                    channel_records.extend(self.splitter.split(record));
                }
            }
            tracing::info!(
                channel = %channel,
                messages = messages.len(),
                records = channel_records.len(),
                "Processed channel"
            );
            records.extend(channel_records);
        }

        if group_threads {
            let threads = slack::group_by_thread(records);
            tracing::info!(threads = threads.len(), "Grouped messages by thread");
            return Ok(threads
                .into_iter()
                .flat_map(|thread| self.splitter.split(thread))
                .collect());
        }
        Ok(records)
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn to_english(&self, text: &str, language: Language) -> Result<String, IngestError> {
        if language.is_english() {
            return Ok(text.to_string());
        }
        Ok(translate_text(self.chat.as_ref(), text, Language::English, &self.glossary).await?)
    }
}

fn document_metadata(document: &ExtractedDocument, language: Language) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(
        "source".into(),
        Value::String(OFFICIAL_DOCUMENT_SOURCE.to_string()),
    );
    metadata.insert(
        "file_name".into(),
        Value::String(document.file_name.clone()),
    );
    metadata.insert(
        "file_type".into(),
        Value::String(document.file_type.as_str().to_string()),
    );
    metadata.insert(
        "original_language".into(),
        Value::String(language.name().to_string()),
    );
    if document.file_type == FileType::Xlsx {
        metadata.insert(
            "sheets".into(),
            Value::Array(
                document
                    .sheets
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::tests::ScriptedChat;
    use docx_rs::{Docx, Paragraph, Run};
    use serde_json::json;
    use std::fs::{self, File};

    fn settings() -> IngestSettings {
        IngestSettings {
            chunk_size: 800,
            chunk_overlap: 0,
            model: "gpt-4o".into(),
        }
    }

    fn service(chat: Arc<ScriptedChat>) -> IngestService {
        IngestService::new(chat, &settings(), Glossary::default()).expect("service")
    }

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
        });
        docx.build()
            .pack(File::create(path).expect("create"))
            .expect("pack");
    }

    #[tokio::test]
    async fn english_documents_are_not_translated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Customer Success Manual.docx");
        write_docx(
            &path,
            &[
                "Customer Success Manual",
                "Every reclaim must be checked against the official guideline before it is approved.",
            ],
        );
        let chat = Arc::new(ScriptedChat::default());
        let service = service(chat.clone());

        let records = service.process_document(&path).await.expect("process");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(record.content.starts_with("Customer Success Manual\nEvery reclaim"));
        assert_eq!(record.metadata["source"], "official_document");
        assert_eq!(record.metadata["file_name"], "Customer Success Manual.docx");
        assert_eq!(record.metadata["file_type"], "docx");
        assert_eq!(record.metadata["original_language"], "English");
        assert!(record.metadata.get("sheets").is_none());
        assert_eq!(chat.request_count(), 0);
        assert_eq!(service.metrics_snapshot().records_produced, 1);
    }

    #[tokio::test]
    async fn dutch_documents_are_translated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("FAQ supply NL.docx");
        write_docx(
            &path,
            &[
                "Veelgestelde vragen over het aanbod van vakmensen in Nederland.",
                "Wanneer een klant een klacht indient, controleren wij eerst of de vakman \
                 de opdracht heeft uitgevoerd volgens de afspraken die vooraf zijn gemaakt.",
            ],
        );
        let chat = Arc::new(ScriptedChat::with_replies(&["Frequently asked questions."]));
        let service = service(chat.clone());

        let records = service.process_document(&path).await.expect("process");
        assert_eq!(records[0].content, "Frequently asked questions.");
        assert_eq!(records[0].metadata["original_language"], "Dutch");
        assert_eq!(chat.request_count(), 1);
    }

    #[tokio::test]
    async fn failing_documents_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("manual.docx");
        write_docx(&good, &["The reclaim window is fourteen days after the job is done."]);
        let empty = dir.path().join("empty.docx");
        write_docx(&empty, &["   "]);
        let unsupported = dir.path().join("notes.txt");
        fs::write(&unsupported, "plain").unwrap();

        let service = service(Arc::new(ScriptedChat::default()));
        let records = service
            .process_documents(&[good, empty, unsupported])
            .await;

        assert_eq!(records.len(), 1);
        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.documents_processed, 1);
        assert_eq!(snapshot.files_skipped, 2);
    }

    #[tokio::test]
    async fn conversations_become_records_per_message() {
        let root = tempfile::tempdir().expect("tempdir");
        let help = root.path().join("help");
        fs::create_dir(&help).unwrap();
        fs::write(
            help.join("2024-02-07.json"),
            json!([
                {
                    "text": "How long does a customer have to file a reclaim after the job?",
                    "ts": "1707300000.000100",
                    "user": "U1"
                },
                {
                    "text": "Fourteen days, see the reclaim guideline for the exceptions.",
                    "ts": "1707300100.000200",
                    "thread_ts": "1707300000.000100",
                    "user": "U2"
                },
                { "subtype": "channel_join", "ts": "1707300200.000300", "user": "U3" }
            ])
            .to_string(),
        )
        .unwrap();

        let service = service(Arc::new(ScriptedChat::default()));
        let channels = vec!["help".to_string(), "product-changes".to_string()];

        let records = service
            .process_conversations(root.path(), &channels, false)
            .await
            .expect("conversations");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].metadata["thread_ts"], "1707300000.000100");
        assert_eq!(records[1].metadata["channel"], "help");
        assert_eq!(records[1].metadata["source"], "help");

        let threads = service
            .process_conversations(root.path(), &channels, true)
            .await
            .expect("threads");
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].metadata["message_count"], json!(2));
        assert!(threads[0].content.starts_with("U1: How long"));
    }
}
