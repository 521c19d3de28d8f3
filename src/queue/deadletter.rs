//! Bounded in-memory dead-letter store for failed ingestion messages.
//!
//! A message that exhausts its retries, or fails terminally, lands here with
//! its error and attempt count so an operator can inspect and re-drive it.
//! The store keeps the most recent entries up to a fixed capacity.

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::Mutex;

/// One dead-lettered message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterEntry {
    /// Document id from the message, when the payload was parseable.
    pub document_id: Option<String>,
    /// Error that terminated processing.
    pub error: String,
    /// Number of ingestion attempts made before giving up.
    pub attempts: u32,
    /// RFC 3339 timestamp of the final failure.
    pub failed_at: String,
}

/// Bounded store of recent dead-lettered messages.
pub struct DeadLetterQueue {
    entries: Mutex<Vec<DeadLetterEntry>>,
    capacity: usize,
}

impl DeadLetterQueue {
    /// Create a store retaining at most `capacity` entries.
    ///
    /// A capacity below one is raised to one so the store always holds the
    /// most recent failure.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record a failed message, evicting the oldest entry when full.
    pub async fn push(&self, document_id: Option<String>, error: String, attempts: u32) {
        let failed_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .expect("UTC timestamp formats");
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            entries.remove(0);
        }
        entries.push(DeadLetterEntry {
            document_id,
            error,
            attempts,
            failed_at,
        });
    }

    /// Copy of the current entries, oldest first.
    pub async fn snapshot(&self) -> Vec<DeadLetterEntry> {
        self.entries.lock().await.clone()
    }
}
