//! Log segment reader
//!
//! Re-segments a flat log file into discrete entries. A line that starts with
//! a `YYYY-MM-DD HH:MM:SS` timestamp opens a new entry; every other line is a
//! continuation of the entry before it (extra values, stack traces).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::level::Level;

static ENTRY_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}").expect("entry start pattern is valid")
});

/// Check whether a line opens a new entry
pub fn is_entry_start(line: &str) -> bool {
    ENTRY_START.is_match(line)
}

/// Parse the severity token (third whitespace-delimited field) of a head line
pub fn parse_level(line: &str) -> Option<Level> {
    line.split_whitespace().nth(2).and_then(Level::from_name)
}

/// One reconstructed entry: its head line plus any continuation lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Parsed severity, `None` when the token was not recognized
    pub level: Option<Level>,
    /// Lines without trailing newlines
    pub lines: Vec<String>,
    /// Set on the synthetic entry that reports a read failure
    pub read_failed: bool,
}

impl Segment {
    pub fn new(level: Option<Level>, lines: Vec<String>) -> Self {
        Self {
            level,
            lines,
            read_failed: false,
        }
    }

    /// Synthetic entry used to surface read failures to the viewer
    pub fn read_error(err: impl std::fmt::Display) -> Self {
        Self {
            level: None,
            lines: vec![format!("Error reading log file: {err}")],
            read_failed: true,
        }
    }

    /// First line of the entry
    pub fn head(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or("")
    }
}

/// Lazy one-pass iterator over the segments of a character stream
///
/// Segments whose level is below `threshold` are skipped. An I/O error ends
/// the scan with a single synthetic [`Segment::read_error`]; segments yielded
/// before it are not withdrawn.
pub struct Segments<R> {
    reader: R,
    threshold: Option<Level>,
    current: Option<Segment>,
    done: bool,
}

impl<R: BufRead> Segments<R> {
    pub fn new(reader: R, threshold: Option<Level>) -> Self {
        Self {
            reader,
            threshold,
            current: None,
            done: false,
        }
    }

    fn passes(&self, segment: &Segment) -> bool {
        segment.level >= self.threshold
    }
}

impl<R: BufRead> Iterator for Segments<R> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.done {
            return None;
        }

        let mut buf = String::new();
        loop {
            buf.clear();
            match self.reader.read_line(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return self.current.take().filter(|s| self.passes(s));
                }
                Ok(_) => {
                    let line = buf.trim_end_matches(['\n', '\r']).to_string();
                    if is_entry_start(&line) {
                        let next = Segment::new(parse_level(&line), vec![line]);
                        if let Some(previous) = self.current.replace(next) {
                            if self.passes(&previous) {
                                return Some(previous);
                            }
                        }
                    } else if let Some(current) = self.current.as_mut() {
                        current.lines.push(line);
                    }
                }
                Err(e) => {
                    self.done = true;
                    self.current = None;
                    return Some(Segment::read_error(e));
                }
            }
        }
    }
}

/// Read every segment of a log file at or above `threshold`, oldest first
///
/// Never fails: a file that cannot be opened or read to the end yields only
/// the error segment, with any partially read entries discarded.
pub fn read_segments(path: &Path, threshold: Option<Level>) -> Vec<Segment> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return vec![Segment::read_error(e)],
    };

    let mut segments: Vec<Segment> = Segments::new(BufReader::new(file), threshold).collect();
    match segments.pop() {
        Some(last) if last.read_failed => vec![last],
        Some(last) => {
            segments.push(last);
            segments
        }
        None => segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    const SAMPLE: &str = "2025-01-01 10:00:00 DEBUG a\n\
                          2025-01-01 10:00:01 INFO b\n\
                          2025-01-01 10:00:02 ERROR c\n";

    fn heads(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(|s| s.head()).collect()
    }

    #[test]
    fn test_threshold_filters_entries() {
        let segments: Vec<_> = Segments::new(Cursor::new(SAMPLE), Some(Level::Info)).collect();
        assert_eq!(
            heads(&segments),
            vec!["2025-01-01 10:00:01 INFO b", "2025-01-01 10:00:02 ERROR c"]
        );
    }

    #[test]
    fn test_inclusion_iff_level_at_least_threshold() {
        for threshold in Level::ALL {
            let segments: Vec<_> =
                Segments::new(Cursor::new(SAMPLE), Some(threshold)).collect();
            for segment in &segments {
                assert!(segment.level >= Some(threshold));
            }
            let expected = [Level::Debug, Level::Info, Level::Error]
                .iter()
                .filter(|l| **l >= threshold)
                .count();
            assert_eq!(segments.len(), expected);
        }
    }

    #[test]
    fn test_continuation_lines_stay_with_entry() {
        let input = "2025-01-01 10:00:00 ERROR failed\n\
                     Traceback (most recent call last):\n\
                     \x20 File \"x\", line 1\n\
                     2025-01-01 10:00:01 INFO next\n";
        let segments: Vec<_> = Segments::new(Cursor::new(input), None).collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].lines.len(), 3);
        assert_eq!(segments[0].lines[1], "Traceback (most recent call last):");
        assert_eq!(segments[1].lines, vec!["2025-01-01 10:00:01 INFO next"]);
    }

    #[test]
    fn test_lines_before_first_head_are_dropped() {
        let input = "orphan line\n2025-01-01 10:00:00 INFO kept\n";
        let segments: Vec<_> = Segments::new(Cursor::new(input), None).collect();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].lines, vec!["2025-01-01 10:00:00 INFO kept"]);
    }

    #[test]
    fn test_unknown_level_is_unset() {
        let input = "2025-01-01 10:00:00 NOTICE something\n2025-01-01 10:00:01\n";
        let all: Vec<_> = Segments::new(Cursor::new(input), None).collect();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|s| s.level.is_none()));

        let filtered: Vec<_> = Segments::new(Cursor::new(input), Some(Level::Debug)).collect();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_last_entry_without_trailing_newline() {
        let input = "2025-01-01 10:00:00 WARNING end";
        let segments: Vec<_> = Segments::new(Cursor::new(input), None).collect();
        assert_eq!(segments[0].level, Some(Level::Warning));
        assert_eq!(segments[0].head(), "2025-01-01 10:00:00 WARNING end");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Segments::new(Cursor::new(""), None).count(), 0);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_io_error_becomes_single_segment() {
        let segments: Vec<_> =
            Segments::new(BufReader::new(FailingReader), Some(Level::Critical)).collect();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].read_failed);
        assert!(segments[0].head().starts_with("Error reading log file:"));
        assert!(segments[0].head().contains("disk on fire"));
    }

    #[test]
    fn test_invalid_utf8_becomes_error_segment() {
        let bytes: &[u8] = b"2025-01-01 10:00:00 INFO ok\n\xff\xfe\n";
        let segments: Vec<_> = Segments::new(Cursor::new(bytes), None).collect();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].head().starts_with("Error reading log file:"));
    }

    #[test]
    fn test_read_segments_missing_file() {
        let segments = read_segments(Path::new("/nonexistent/justlog/app.log"), None);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].read_failed);
        assert!(segments[0].head().starts_with("Error reading log file:"));
    }

    #[test]
    fn test_read_segments_discards_entries_before_read_failure() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(
            &path,
            b"2025-01-01 10:00:00 INFO a\n2025-01-01 10:00:01 INFO b\n\xff\n",
        )
        .unwrap();

        let segments = read_segments(&path, None);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].read_failed);
        assert!(segments[0].head().starts_with("Error reading log file:"));
    }

    #[test]
    fn test_read_segments_clean_file_keeps_every_entry() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, SAMPLE).unwrap();

        let segments = read_segments(&path, None);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| !s.read_failed));
    }

    #[test]
    fn test_is_entry_start() {
        assert!(is_entry_start("2025-10-05 15:23:45 INFO message"));
        assert!(is_entry_start("2025-10-05\t15:23:45"));
        assert!(!is_entry_start("  2025-10-05 15:23:45 INFO indented"));
        assert!(!is_entry_start("25-10-05 15:23:45 INFO short year"));
    }
}
