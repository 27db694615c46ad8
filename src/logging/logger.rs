//! The logger object
//!
//! A [`Logger`] is built once from a [`LoggerConfig`] and passed to whatever
//! needs to log. It formats each call with the [`StructuredFormatter`] and
//! hands the block to every sink whose level accepts it.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;

use super::formatter::StructuredFormatter;
use super::level::Level;
use super::record::LogEntry;
use super::retention;
use super::rotating::RotatingFile;
use super::sink::{FileSink, LogSink, RowStoreSink, StderrSink};
use super::store::RowStore;
use crate::config::LoggerConfig;

/// Target of the logger's own diagnostics; never forwarded back into a logger
pub const DIAGNOSTICS_TARGET: &str = "justlog::diagnostics";

/// Message recorded by the panic hook
pub const PANIC_MESSAGE: &str = "uncaught exception, application will terminate.";

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Marks this thread as inside [`Logger::dispatch`] until dropped
struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Option<Self> {
        if DISPATCHING.with(|d| d.replace(true)) {
            None
        } else {
            Some(Self)
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|d| d.set(false));
    }
}

/// Configured logging front end
pub struct Logger {
    name: String,
    level: Level,
    backup_days: u64,
    formatter: StructuredFormatter,
    sinks: Vec<Arc<dyn LogSink>>,
    file: Option<Arc<FileSink>>,
    row_store: Option<Arc<dyn RowStore>>,
}

impl Default for Logger {
    /// Stderr-only logger at WARNING, for code that runs before setup
    fn default() -> Self {
        let config = LoggerConfig::stderr_default();
        let mut logger = Self::bare(&config);
        logger
            .sinks
            .push(Arc::new(StderrSink::new(config.stderr_level.unwrap_or(config.level))));
        logger
    }
}

impl Logger {
    /// Build a logger from configuration
    ///
    /// Creates the log file and its parent directories, installs the file and
    /// stderr sinks, and runs the retention sweep when `backup_days` is set.
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let mut logger = Self::bare(config);

        if let Some(path) = &config.log_file_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let file = RotatingFile::open(path, config.max_bytes, config.backup_count)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let sink = Arc::new(FileSink::new(file, config.level));
            logger.sinks.push(sink.clone());
            logger.file = Some(sink);
        }

        if let Some(stderr_level) = config.stderr_level {
            logger.sinks.push(Arc::new(StderrSink::new(stderr_level)));
        }

        if logger.backup_days > 0 {
            logger.cleanup_old_logs()?;
        }

        Ok(logger)
    }

    fn bare(config: &LoggerConfig) -> Self {
        Self {
            name: config.logger_name.clone(),
            level: config.level,
            backup_days: config.backup_days,
            formatter: StructuredFormatter::new(config.date_format.clone()),
            sinks: Vec::new(),
            file: None,
            row_store: None,
        }
    }

    /// Attach a row store; entries at or above `level` are inserted as rows
    pub fn with_row_store(mut self, store: Arc<dyn RowStore>, level: Level) -> Self {
        self.sinks
            .push(Arc::new(RowStoreSink::new(store.clone(), level)));
        self.row_store = Some(store);
        self
    }

    /// Attach an arbitrary sink
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn formatter(&self) -> &StructuredFormatter {
        &self.formatter
    }

    /// Path of the active log file, if a file sink is configured
    pub fn log_file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    pub fn row_store(&self) -> Option<Arc<dyn RowStore>> {
        self.row_store.clone()
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Format and deliver a fully built entry
    ///
    /// A failing sink is reported through `tracing` and never stops delivery
    /// to the others. An entry raised while this thread is already
    /// dispatching (a panic inside a sink reaching the panic hook) goes
    /// straight to stderr, since the interrupted sink may still hold its lock.
    pub fn dispatch(&self, entry: LogEntry) {
        if !self.is_enabled(entry.level) {
            return;
        }

        let rendered = self.formatter.format(&entry);
        let Some(_guard) = DispatchGuard::enter() else {
            let _ = writeln!(io::stderr(), "{}", rendered);
            return;
        };
        for sink in self.sinks.iter().filter(|s| s.accepts(entry.level)) {
            if let Err(e) = sink.emit(&entry, &rendered) {
                tracing::warn!(
                    target: DIAGNOSTICS_TARGET,
                    logger = %self.name,
                    sink = sink.name(),
                    error = %e,
                    "Failed to emit log entry"
                );
            }
        }
    }

    /// Start a call that can carry extra values
    pub fn event(&self, level: Level, message: impl Into<String>) -> Event<'_> {
        Event {
            logger: self,
            entry: LogEntry::new(level, message),
        }
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.dispatch(LogEntry::new(level, message));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    /// Apply the `backup_days` retention policy to the file, its backups and the row store
    ///
    /// Rewrites the log file in place; not safe while another process
    /// appends to the same file.
    pub fn cleanup_old_logs(&self) -> Result<usize> {
        if self.backup_days == 0 {
            return Ok(0);
        }

        let now = Local::now();
        let mut removed = 0;

        if let Some(file) = &self.file {
            removed += retention::sweep_log_file(file.path(), self.backup_days, now)?;
            removed += retention::cleanup_rotated_backups(file.path(), self.backup_days)?;
            file.reopen().context("Failed to reopen log file after sweep")?;
        }
        if let Some(store) = &self.row_store {
            removed += retention::sweep_row_store(store.as_ref(), self.backup_days, now)?;
        }

        if removed > 0 {
            tracing::info!(
                target: DIAGNOSTICS_TARGET,
                logger = %self.name,
                removed,
                "Removed old log entries"
            );
        }
        Ok(removed)
    }

    /// Record panics at CRITICAL before the previous hook runs
    ///
    /// A panic raised inside a sink is written to stderr instead of the sinks.
    pub fn install_panic_hook(logger: Arc<Logger>) {
        let previous_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let mut event = logger
                .event(Level::Critical, PANIC_MESSAGE)
                .field("panic", panic_payload_message(info.payload()));
            if let Some(location) = info.location() {
                event = event.field(
                    "location",
                    format!("{}:{}:{}", location.file(), location.line(), location.column()),
                );
            }
            event.value(Backtrace::force_capture().to_string()).emit();

            previous_hook(info);
        }));
    }
}

/// Extract a readable message from a panic payload
pub fn panic_payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A pending log call; extras are attached before [`Event::emit`]
#[must_use = "an event does nothing until emitted"]
pub struct Event<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> Event<'a> {
    /// Attach a positional value
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.entry.extra_values.push(value.into());
        self
    }

    /// Attach a named value; repeating a name overwrites the earlier value
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry.set_field(name, value);
        self
    }

    pub fn emit(self) {
        self.logger.dispatch(self.entry);
    }
}
