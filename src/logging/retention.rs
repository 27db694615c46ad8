//! Log retention management
//!
//! Handles age-based cleanup of the active log file, its rotated backups and
//! the row store.
//!
//! The file sweep reads the whole file, filters it and rewrites it in place.
//! It takes no lock, so entries appended by another writer while it runs can
//! be lost. Run it at a quiet point (startup, or with logging paused).

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};

use super::reader::is_entry_start;
use super::rotating::is_backup_of;
use super::store::RowStore;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

const HEAD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse the `YYYY-MM-DD HH:MM:SS` timestamp at the start of a head line
pub fn parse_head_timestamp(line: &str) -> Option<NaiveDateTime> {
    let mut fields = line.split_whitespace();
    let date = fields.next()?;
    let time = fields.next()?;
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), HEAD_TIMESTAMP_FORMAT).ok()
}

// Clamped so the subtraction below stays inside chrono's date range
const MAX_RETENTION_DAYS: u64 = 1_000_000;

fn retention_age(retention_days: u64) -> chrono::Duration {
    chrono::Duration::days(retention_days.min(MAX_RETENTION_DAYS) as i64)
}

fn cutoff_for(now: DateTime<Local>, retention_days: u64) -> NaiveDateTime {
    now.naive_local()
        .checked_sub_signed(retention_age(retention_days))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Remove entries older than `retention_days` from a log file
///
/// Whole entries are removed: a dropped head line takes its continuation lines
/// with it. Lines whose timestamp cannot be parsed are kept, as are lines that
/// precede the first entry. The file is only rewritten when something was
/// dropped.
///
/// Returns the number of entries removed.
pub fn sweep_log_file(path: &Path, retention_days: u64, now: DateTime<Local>) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file {}", path.display()))?;
    let cutoff = cutoff_for(now, retention_days);

    let mut kept = String::with_capacity(content.len());
    let mut keeping = true;
    let mut dropped = 0;

    for line in content.split_inclusive('\n') {
        if is_entry_start(line) {
            keeping = match parse_head_timestamp(line) {
                Some(ts) => ts >= cutoff,
                None => true,
            };
            if !keeping {
                dropped += 1;
            }
        }
        if keeping {
            kept.push_str(line);
        }
    }

    if dropped > 0 {
        fs::write(path, kept)
            .with_context(|| format!("Failed to rewrite log file {}", path.display()))?;
    }

    Ok(dropped)
}

/// Delete rotated backups (`<stem>_r<n>.<ext>`) last modified before the retention period
///
/// Returns the number of files deleted.
pub fn cleanup_rotated_backups(path: &Path, retention_days: u64) -> Result<usize> {
    let logs_dir = match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => return Ok(0),
    };
    if !logs_dir.exists() {
        return Ok(0);
    }

    let retention_duration = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60));
    let cutoff = SystemTime::now()
        .checked_sub(retention_duration)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut deleted_count = 0;

    for entry in fs::read_dir(logs_dir)? {
        let entry = entry?;
        let file_path = entry.path();

        // Only process numbered backups of this log file
        if !is_backup_of(path, &file_path) {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                if modified < cutoff && fs::remove_file(&file_path).is_ok() {
                    deleted_count += 1;
                }
            }
        }
    }

    Ok(deleted_count)
}

/// Delete rows older than `retention_days` from a row store
pub fn sweep_row_store(
    store: &dyn RowStore,
    retention_days: u64,
    now: DateTime<Local>,
) -> Result<usize> {
    let Some(cutoff) = now.checked_sub_signed(retention_age(retention_days)) else {
        return Ok(0);
    };
    store
        .delete_older_than(cutoff)
        .context("Failed to delete old log rows")
}
