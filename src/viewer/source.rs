//! Viewer sources and pagination
//!
//! A source yields filtered entries newest first; [`Page::paginate`] slices
//! them by whole entries, so a multi-line entry never spans two pages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::logging::{read_segments, Level, LogRow, RowStore, Segment, StructuredFormatter};

/// Which backend a viewer request reads from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    File,
    Db,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Db => "db",
        }
    }
}

/// Backend the viewer reads entries from
pub trait LogSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Whether there is anything to read at all
    fn is_available(&self) -> bool {
        true
    }

    /// Entries at or above `threshold`, newest first
    ///
    /// Read failures come back as a single error entry.
    fn entries(&self, threshold: Option<Level>) -> Vec<Segment>;
}

/// Reads a flat log file through the segment reader
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSource for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }

    fn entries(&self, threshold: Option<Level>) -> Vec<Segment> {
        let mut entries = read_segments(&self.path, threshold);
        entries.reverse();
        entries
    }
}

/// Reads rows from a [`RowStore`], rendered in the same shape as file entries
pub struct RowStoreSource {
    store: Arc<dyn RowStore>,
    formatter: StructuredFormatter,
}

impl RowStoreSource {
    pub fn new(store: Arc<dyn RowStore>, formatter: StructuredFormatter) -> Self {
        Self { store, formatter }
    }

    fn segment_for(&self, row: &LogRow) -> Segment {
        match row.to_entry() {
            Some(entry) => {
                let text = self.formatter.format(&entry);
                Segment::new(Some(entry.level), text.lines().map(str::to_string).collect())
            }
            None => Segment::new(
                None,
                vec![format!(
                    "{} {} {}",
                    row.timestamp.format(self.formatter.date_format()),
                    row.level_name(),
                    row.message
                )],
            ),
        }
    }
}

impl LogSource for RowStoreSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Db
    }

    fn entries(&self, threshold: Option<Level>) -> Vec<Segment> {
        match self.store.rows_desc(threshold) {
            Ok(rows) => rows.iter().map(|row| self.segment_for(row)).collect(),
            Err(e) => vec![Segment::read_error(e)],
        }
    }
}

/// One page of entries plus the numbers needed for navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<Segment>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_entries: usize,
}

impl Page {
    /// Slice `entries` (already newest first) into page `page` of `per_page` entries
    ///
    /// `page` and `per_page` are clamped to at least 1. Pages past the end are
    /// empty.
    pub fn paginate(entries: Vec<Segment>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total_entries = entries.len();
        let total_pages = (total_entries + per_page - 1) / per_page;
        let start = (page - 1).saturating_mul(per_page);

        let entries = entries.into_iter().skip(start).take(per_page).collect();

        Self {
            entries,
            page,
            per_page,
            total_pages,
            total_entries,
        }
    }

    pub fn prev_page(&self) -> Option<usize> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<usize> {
        (self.page < self.total_pages).then(|| self.page + 1)
    }
}
