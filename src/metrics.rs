use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestionMetrics {
    documents_ingested: AtomicU64,
    fragments_indexed: AtomicU64,
    messages_rejected: AtomicU64,
}

impl IngestionMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed document and the number of fragments produced for it.
    pub fn record_document(&self, fragment_count: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.fragments_indexed
            .fetch_add(fragment_count, Ordering::Relaxed);
    }

    /// Record a message rejected by the dispatcher.
    pub fn record_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            fragments_indexed: self.fragments_indexed.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents ingested since startup.
    pub documents_ingested: u64,
    /// Total fragment count written across all ingested documents.
    pub fragments_indexed: u64,
    /// Number of queue messages rejected since startup.
    pub messages_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_fragments() {
        let metrics = IngestionMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);
        metrics.record_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_ingested, 2);
        assert_eq!(snapshot.fragments_indexed, 5);
        assert_eq!(snapshot.messages_rejected, 1);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let metrics = IngestionMetrics::new();
        assert_eq!(metrics.snapshot().documents_ingested, 0);
        assert_eq!(metrics.snapshot().fragments_indexed, 0);
        assert_eq!(metrics.snapshot().messages_rejected, 0);
    }
}
