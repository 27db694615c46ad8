//! Sinks that receive formatted entries
//!
//! Each sink has its own minimum level. A failing sink reports the error to the
//! logger, which keeps delivering to the remaining sinks.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::level::Level;
use super::record::LogEntry;
use super::rotating::RotatingFile;
use super::store::{RowStore, StoreError};

/// Errors raised while emitting to a sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("sink lock poisoned")]
    Poisoned,
}

/// A destination for log entries
pub trait LogSink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Minimum level this sink accepts
    fn level(&self) -> Level;

    /// Deliver one entry; `rendered` is the formatted text block
    fn emit(&self, entry: &LogEntry, rendered: &str) -> Result<(), SinkError>;

    fn accepts(&self, level: Level) -> bool {
        level >= self.level()
    }
}

/// Appends formatted blocks to a size-rotated file
pub struct FileSink {
    file: Mutex<RotatingFile>,
    path: PathBuf,
    level: Level,
}

impl FileSink {
    pub fn new(file: RotatingFile, level: Level) -> Self {
        let path = file.path().to_path_buf();
        Self {
            file: Mutex::new(file),
            path,
            level,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-open the file after an external rewrite (retention sweep)
    pub fn reopen(&self) -> Result<(), SinkError> {
        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        file.reopen()?;
        Ok(())
    }
}

impl LogSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, _entry: &LogEntry, rendered: &str) -> Result<(), SinkError> {
        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        file.write_record(rendered)?;
        Ok(())
    }
}

/// Writes formatted blocks to stderr
pub struct StderrSink {
    level: Level,
}

impl StderrSink {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl LogSink for StderrSink {
    fn name(&self) -> &str {
        "stderr"
    }

    fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, _entry: &LogEntry, rendered: &str) -> Result<(), SinkError> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", rendered)?;
        Ok(())
    }
}

/// Inserts entries as rows into a [`RowStore`]
pub struct RowStoreSink {
    store: Arc<dyn RowStore>,
    level: Level,
}

impl RowStoreSink {
    pub fn new(store: Arc<dyn RowStore>, level: Level) -> Self {
        Self { store, level }
    }
}

impl LogSink for RowStoreSink {
    fn name(&self) -> &str {
        "row-store"
    }

    fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, entry: &LogEntry, _rendered: &str) -> Result<(), SinkError> {
        self.store.insert(entry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::store::MemoryRowStore;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_appends_rendered_block() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let sink = FileSink::new(RotatingFile::open(&path, 0, 0).unwrap(), Level::Info);

        let entry = LogEntry::new(Level::Info, "hello");
        sink.emit(&entry, "2025-01-01 10:00:00 INFO hello\n  extra: 1")
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "2025-01-01 10:00:00 INFO hello\n  extra: 1\n"
        );
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn test_sink_accepts() {
        let sink = StderrSink::new(Level::Warning);
        assert!(!sink.accepts(Level::Info));
        assert!(sink.accepts(Level::Warning));
        assert!(sink.accepts(Level::Critical));
    }

    #[test]
    fn test_row_store_sink_inserts() {
        let store = Arc::new(MemoryRowStore::new());
        let sink = RowStoreSink::new(store.clone(), Level::Debug);

        sink.emit(&LogEntry::new(Level::Error, "boom"), "ignored")
            .unwrap();

        let rows = store.rows_desc(None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message, "boom");
        assert_eq!(rows[0].level, 40);
    }
}
