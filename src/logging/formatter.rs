//! Structured line formatter
//!
//! Turns a [`LogEntry`] into the multi-line text block that is appended to a
//! log file. The first line always matches the head pattern the reader looks
//! for; every extra value becomes an indented continuation line.

use serde_json::Value;

use super::record::{value_text, LogEntry};

/// Default timestamp layout, `2025-10-05 15:23:45`
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INDENT: &str = "  ";

/// Formats entries as `<timestamp> <LEVEL> <message>` plus continuation lines
#[derive(Debug, Clone)]
pub struct StructuredFormatter {
    date_format: String,
}

impl Default for StructuredFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl StructuredFormatter {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Format one entry into a newline-joined block (no trailing newline)
    pub fn format(&self, entry: &LogEntry) -> String {
        let mut lines = vec![format!(
            "{} {} {}",
            entry.timestamp.format(&self.date_format),
            entry.level,
            entry.message
        )];

        for value in &entry.extra_values {
            let text = value_text(value);
            match pretty_json(&text) {
                Some(pretty) => push_indented(&mut lines, &pretty, INDENT),
                None => push_indented(&mut lines, &text, INDENT),
            }
        }

        for (name, value) in &entry.extra_named_values {
            let text = value_text(value);
            match pretty_json(&text) {
                Some(pretty) => {
                    lines.push(format!("{INDENT}{name}:"));
                    push_indented(&mut lines, &pretty, "    ");
                }
                None => push_named_scalar(&mut lines, name, &text),
            }
        }

        lines.join("\n")
    }
}

/// Pretty-print `text` with 2-space indentation if it is a JSON object or array
///
/// Anything that merely looks like JSON but does not parse yields `None`.
pub fn pretty_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let looks_like_json = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !looks_like_json {
        return None;
    }

    let parsed: Value = serde_json::from_str(trimmed).ok()?;
    if !(parsed.is_object() || parsed.is_array()) {
        return None;
    }
    serde_json::to_string_pretty(&parsed).ok()
}

fn push_indented(lines: &mut Vec<String>, text: &str, indent: &str) {
    if text.is_empty() {
        lines.push(indent.to_string());
        return;
    }
    lines.extend(text.lines().map(|line| format!("{indent}{line}")));
}

fn push_named_scalar(lines: &mut Vec<String>, name: &str, text: &str) {
    let mut rest = text.lines();
    let first = rest.next().unwrap_or("");
    lines.push(format!("{INDENT}{name}: {first}"));
    // Keep later lines of a multi-line value from looking like a new entry
    lines.extend(rest.map(|line| format!("{INDENT}{INDENT}{line}")));
}
