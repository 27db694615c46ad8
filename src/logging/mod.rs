//! Logging system for justlog
//!
//! Provides the structured formatter, the logger and its sinks (rotating file,
//! stderr, row store), the segment reader used by the viewer, and retention.

mod bridge;
mod formatter;
mod level;
mod logger;
mod reader;
mod record;
mod retention;
mod rotating;
mod sink;
mod store;

pub use bridge::JustlogLayer;
pub use formatter::{pretty_json, StructuredFormatter, DEFAULT_DATE_FORMAT};
pub use level::{Level, UnknownLevel};
pub use logger::{panic_payload_message, Event, Logger, DIAGNOSTICS_TARGET, PANIC_MESSAGE};
pub use reader::{is_entry_start, parse_level, read_segments, Segment, Segments};
pub use record::{value_text, LogEntry};
pub use retention::{
    cleanup_rotated_backups, parse_head_timestamp, sweep_log_file, sweep_row_store,
    DEFAULT_RETENTION_DAYS,
};
pub use rotating::{backup_path, is_backup_of, RotatingFile};
pub use sink::{FileSink, LogSink, RowStoreSink, SinkError, StderrSink};
pub use store::{LogRow, MemoryRowStore, RowStore, StoreError};
