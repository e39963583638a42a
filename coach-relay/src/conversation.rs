//! Conversation log and its persisted form

use crate::complexity::ComplexityEstimate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Entries kept in memory and on disk
pub const MAX_HISTORY: usize = 50;

/// Who wrote an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single message in the coaching conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub message: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityEstimate>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sender: Sender::User,
            complexity: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(message: impl Into<String>, complexity: Option<ComplexityEstimate>) -> Self {
        Self {
            message: message.into(),
            sender: Sender::Assistant,
            complexity,
            timestamp: Utc::now(),
        }
    }
}

/// Persisted record: the history and the problem URL it belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub url: String,
    pub history: Vec<ConversationEntry>,
}

/// Append-only conversation for one problem page
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    url: String,
    entries: Vec<ConversationEntry>,
}

impl ConversationLog {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            entries: Vec::new(),
        }
    }

    /// Restore from a persisted record, only if it belongs to `url`
    pub fn restore(url: &str, record: Option<HistoryRecord>) -> Self {
        let mut log = Self::new(url);
        match record {
            Some(record) if record.url == url => {
                debug!(url, entries = record.history.len(), "Restored conversation");
                log.entries = record.history;
                log.truncate();
            }
            Some(record) => {
                debug!(stored = %record.url, current = url, "Ignoring history of another problem");
            }
            None => {}
        }
        log
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, dropping the oldest beyond [`MAX_HISTORY`]
    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
        self.truncate();
    }

    /// The most recent `n` entries, oldest first
    pub fn recent(&self, n: usize) -> &[ConversationEntry] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_record(&self) -> HistoryRecord {
        HistoryRecord {
            url: self.url.clone(),
            history: self.entries.clone(),
        }
    }

    fn truncate(&mut self) {
        if self.entries.len() > MAX_HISTORY {
            let excess = self.entries.len() - MAX_HISTORY;
            self.entries.drain(..excess);
        }
    }
}

/// Errors from history persistence
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("History I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("History is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat key-value persistence for the conversation record
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Option<HistoryRecord>, StoreError>;

    fn save(&self, record: &HistoryRecord) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    /// Save without surfacing failures
    fn save_quietly(&self, record: &HistoryRecord) {
        if let Err(e) = self.save(record) {
            warn!(error = %e, "Failed to persist conversation history");
        }
    }

    /// Clear without surfacing failures
    fn clear_quietly(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "Failed to clear conversation history");
        }
    }
}

/// Stores the record as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<Option<HistoryRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(record)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for hosts without persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<HistoryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: HistoryRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    /// Current stored record
    pub fn snapshot(&self) -> Option<HistoryRecord> {
        self.record.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Option<HistoryRecord>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        if let Ok(mut slot) = self.record.lock() {
            *slot = Some(record.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if let Ok(mut slot) = self.record.lock() {
            *slot = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_truncates_to_max() {
        let mut log = ConversationLog::new("https://x/p");
        for i in 0..(MAX_HISTORY + 7) {
            log.push(ConversationEntry::user(format!("m{i}")));
        }
        assert_eq!(log.len(), MAX_HISTORY);
        assert_eq!(log.entries()[0].message, "m7");
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(2)[1].message, format!("m{}", MAX_HISTORY + 6));
    }

    #[test]
    fn test_restore_requires_matching_url() {
        let record = HistoryRecord {
            url: "https://x/two-sum".to_string(),
            history: vec![ConversationEntry::user("hi")],
        };

        let same = ConversationLog::restore("https://x/two-sum", Some(record.clone()));
        assert_eq!(same.len(), 1);

        let other = ConversationLog::restore("https://x/three-sum", Some(record));
        assert!(other.is_empty());
        assert_eq!(other.url(), "https://x/three-sum");
    }

    #[test]
    fn test_json_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("history.json"));
        assert!(store.load().unwrap().is_none());

        let mut log = ConversationLog::new("https://x/p");
        log.push(ConversationEntry::user("approach?"));
        log.push(ConversationEntry::assistant(
            "Think about sorting.",
            Some(ComplexityEstimate::unknown()),
        ));
        store.save(&log.to_record()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, log.to_record());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_entry_wire_defaults() {
        let entry: ConversationEntry =
            serde_json::from_str(r#"{"message":"hi","sender":"assistant"}"#).unwrap();
        assert_eq!(entry.sender, Sender::Assistant);
        assert!(entry.complexity.is_none());
    }
}
