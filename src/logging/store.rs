//! Row store for persisted log entries
//!
//! Provides the [`RowStore`] seam plus a thread-safe in-memory implementation.
//! Rows mirror the table layout: indexed timestamp and level code, message
//! text, and nullable structured extras.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::level::Level;
use super::record::LogEntry;

/// Errors raised by a row store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row store lock poisoned")]
    Poisoned,
    #[error("row store backend error: {0}")]
    Backend(String),
}

/// A stored log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    /// Auto-increment identifier
    pub id: u64,
    /// When the entry was recorded
    pub timestamp: DateTime<Local>,
    /// Numeric level code (10..=50)
    pub level: i32,
    /// Primary message
    pub message: String,
    /// Positional extras as a JSON array, `None` when there were none
    pub extra_values: Option<Value>,
    /// Named extras as a JSON object, `None` when there were none
    pub extra_named_values: Option<Value>,
}

impl LogRow {
    /// Build a row from an entry (id assigned by the store)
    pub fn from_entry(id: u64, entry: &LogEntry) -> Self {
        let extra_values = if entry.extra_values.is_empty() {
            None
        } else {
            Some(Value::Array(entry.extra_values.clone()))
        };
        let extra_named_values = if entry.extra_named_values.is_empty() {
            None
        } else {
            let map: Map<String, Value> = entry.extra_named_values.iter().cloned().collect();
            Some(Value::Object(map))
        };

        Self {
            id,
            timestamp: entry.timestamp,
            level: entry.level.code(),
            message: entry.message.clone(),
            extra_values,
            extra_named_values,
        }
    }

    /// Level parsed from the stored code, `None` for unknown codes
    pub fn level(&self) -> Option<Level> {
        Level::from_code(self.level)
    }

    /// Display name of the level
    pub fn level_name(&self) -> &'static str {
        self.level().map(|l| l.as_str()).unwrap_or("NOTSET")
    }

    /// Rebuild the entry this row was stored from
    ///
    /// Rows with an unknown level code come back as `None`.
    pub fn to_entry(&self) -> Option<LogEntry> {
        let mut entry = LogEntry::at(self.timestamp, self.level()?, self.message.clone());
        if let Some(Value::Array(values)) = &self.extra_values {
            entry.extra_values = values.clone();
        }
        if let Some(Value::Object(map)) = &self.extra_named_values {
            entry.extra_named_values = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        }
        Some(entry)
    }

    /// Dictionary form used by JSON consumers
    pub fn to_json(&self) -> Value {
        json!({
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
            "level": self.level,
            "level_name": self.level_name(),
            "message": self.message,
            "extra_values": self.extra_values,
            "extra_named_values": self.extra_named_values,
        })
    }
}

impl fmt::Display for LogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.message.chars().take(50).collect();
        write!(
            f,
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level_name(),
            short
        )
    }
}

/// Destination and source for persisted log rows
pub trait RowStore: Send + Sync {
    /// Insert an entry, returning the new row id
    fn insert(&self, entry: &LogEntry) -> Result<u64, StoreError>;

    /// Rows at or above `threshold`, newest first
    fn rows_desc(&self, threshold: Option<Level>) -> Result<Vec<LogRow>, StoreError>;

    /// Delete rows recorded before `cutoff`, returning how many were removed
    fn delete_older_than(&self, cutoff: DateTime<Local>) -> Result<usize, StoreError>;

    /// Number of stored rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory row store
#[derive(Default)]
pub struct MemoryRowStore {
    rows: RwLock<Vec<LogRow>>,
    last_id: AtomicU64,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowStore for MemoryRowStore {
    fn insert(&self, entry: &LogEntry) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        // Ids are never reused, even after a retention sweep
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        rows.push(LogRow::from_entry(id, entry));
        Ok(id)
    }

    fn rows_desc(&self, threshold: Option<Level>) -> Result<Vec<LogRow>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        let mut selected: Vec<LogRow> = rows
            .iter()
            .filter(|r| r.level() >= threshold)
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(selected)
    }

    fn delete_older_than(&self, cutoff: DateTime<Local>) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let before = rows.len();
        rows.retain(|r| r.timestamp >= cutoff);
        Ok(before - rows.len())
    }

    fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }
}
