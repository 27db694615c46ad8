//! Tracing layer that forwards events into a [`Logger`]
//!
//! The `message` field becomes the entry message; every other field becomes a
//! named value, so `tracing::info!(user = "bob", "login")` is written as
//! `... INFO login` followed by `  user: bob`. The logger's own diagnostics
//! are skipped so a failing sink cannot feed back into itself.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::level::Level;
use super::logger::{Logger, DIAGNOSTICS_TARGET};
use super::record::LogEntry;

/// Forwards tracing events to a [`Logger`]
#[derive(Clone)]
pub struct JustlogLayer {
    logger: Arc<Logger>,
}

impl JustlogLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl<S> Layer<S> for JustlogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() == DIAGNOSTICS_TARGET {
            return;
        }

        let level = Level::from(*event.metadata().level());
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut entry = LogEntry::new(level, visitor.message.unwrap_or_default());
        entry.extra_named_values = visitor.fields;
        self.logger.dispatch(entry);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, Value)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        match self.fields.iter_mut().find(|(name, _)| *name == field.name()) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.name().to_string(), value)),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.push(field, Value::String(text));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use crate::logging::reader::read_segments;
    use tempfile::TempDir;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_tracing_events_reach_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggerConfig::new(temp_dir.path().join("app.log"));
        let logger = Arc::new(Logger::from_config(&config).unwrap());

        let subscriber = tracing_subscriber::registry().with(JustlogLayer::new(logger.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("below threshold");
            tracing::info!(user = "bob", attempts = 3, "login");
            tracing::warn!(payload = r#"{"x":1}"#, "odd payload");
        });

        let segments = read_segments(logger.log_file_path().unwrap(), None);
        assert_eq!(segments.len(), 2);

        assert!(segments[0].head().ends_with(" INFO login"));
        assert_eq!(&segments[0].lines[1..], &["  user: bob", "  attempts: 3"]);

        assert_eq!(segments[1].level, Some(Level::Warning));
        assert_eq!(
            &segments[1].lines[1..],
            &["  payload:", "    {", "      \"x\": 1", "    }"]
        );
    }
}
