use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion, upload, and query activity.
#[derive(Default)]
pub struct KnowledgeMetrics {
    documents_processed: AtomicU64,
    records_produced: AtomicU64,
    files_skipped: AtomicU64,
    records_uploaded: AtomicU64,
    queries_answered: AtomicU64,
}

impl KnowledgeMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed source (document or message) and the records produced for it.
    pub fn record_source(&self, record_count: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.records_produced
            .fetch_add(record_count, Ordering::Relaxed);
    }

    /// Record a file that could not be processed.
    pub fn record_skipped_file(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record records handed to the vector store.
    pub fn record_upload(&self, record_count: u64) {
        self.records_uploaded
            .fetch_add(record_count, Ordering::Relaxed);
    }

    /// Record an answered question.
    pub fn record_query(&self) {
        self.queries_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            records_produced: self.records_produced.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            records_uploaded: self.records_uploaded.load(Ordering::Relaxed),
            queries_answered: self.queries_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Sources (documents or Slack messages) processed since startup.
    pub documents_processed: u64,
    /// Records produced across all processed sources.
    pub records_produced: u64,
    /// Files skipped because they were unreadable or unsupported.
    pub files_skipped: u64,
    /// Records included in vector store uploads.
    pub records_uploaded: u64,
    /// Questions answered through the search pipeline.
    pub queries_answered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sources_and_records() {
        let metrics = KnowledgeMetrics::new();
        metrics.record_source(2);
        metrics.record_source(3);
        metrics.record_skipped_file();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_processed, 2);
        assert_eq!(snapshot.records_produced, 5);
        assert_eq!(snapshot.files_skipped, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let metrics = KnowledgeMetrics::new();
        metrics.record_upload(4);
        metrics.record_query();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_processed, 0);
        assert_eq!(snapshot.records_uploaded, 4);
        assert_eq!(snapshot.queries_answered, 1);
    }
}
