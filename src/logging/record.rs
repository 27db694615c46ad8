//! A single logging call captured as data

use chrono::{DateTime, Local};
use serde_json::Value;

use super::level::Level;

/// One logical log record, before it is formatted
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// When the call was made
    pub timestamp: DateTime<Local>,
    /// Severity
    pub level: Level,
    /// Primary human-readable message
    pub message: String,
    /// Auxiliary values attached positionally
    pub extra_values: Vec<Value>,
    /// Auxiliary named values, in the order they were first attached; names are unique
    pub extra_named_values: Vec<(String, Value)>,
}

impl LogEntry {
    /// Create an entry stamped with the current local time
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self::at(Local::now(), level, message)
    }

    /// Create an entry with an explicit timestamp
    pub fn at(timestamp: DateTime<Local>, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            extra_values: Vec::new(),
            extra_named_values: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.extra_values.push(value.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Attach a named value; an existing name keeps its position and takes the new value
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.extra_named_values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.extra_named_values.push((name, value)),
        }
    }
}

/// Canonical text form of a value: strings as-is, everything else as compact JSON
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
