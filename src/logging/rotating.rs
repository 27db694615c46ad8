//! Size-rotated log file
//!
//! Backed by flexi_logger's standalone [`FileLogWriter`], used as a plain
//! byte sink: no global logger is installed and justlog keeps its own format.
//! The active file keeps its configured name. Once it reaches `max_bytes` it
//! is renamed to `<stem>_r00000.<ext>` (then `_r00001`, ...) and only the
//! newest `backup_count` backups are kept.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flexi_logger::writers::{ArcFileLogWriter, FileLogWriter, FileLogWriterHandle};
use flexi_logger::{Cleanup, Criterion, FileSpec, FlexiLoggerError, Naming, WriteMode};

const BACKUP_INFIX: &str = "_r";

/// Path of the `index`-th rotated backup of `path`
pub fn backup_path(path: &Path, index: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}{BACKUP_INFIX}{index:05}");
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

/// Whether `candidate` is a rotated backup of the log file at `path`
pub fn is_backup_of(path: &Path, candidate: &Path) -> bool {
    let (Some(stem), Some(name)) = (
        path.file_stem().and_then(|s| s.to_str()),
        candidate.file_name().and_then(|n| n.to_str()),
    ) else {
        return false;
    };
    let Some(rest) = name
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix(BACKUP_INFIX))
    else {
        return false;
    };
    let index = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => rest
            .strip_suffix(ext)
            .and_then(|rest| rest.strip_suffix('.')),
        None => Some(rest),
    };
    index
        .map(|i| !i.is_empty() && i.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Append-only file handle that rotates by size
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    writer: ArcFileLogWriter,
    // Flushes and closes the writer when dropped
    _handle: FileLogWriterHandle,
}

impl RotatingFile {
    /// Open (creating if needed) `path` for appending
    ///
    /// A `max_bytes` or `backup_count` of zero disables rotation.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        let (writer, handle) = build_writer(&path, max_bytes, backup_count)?;
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            writer,
            _handle: handle,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rotation_enabled(&self) -> bool {
        rotation_enabled(self.max_bytes, self.backup_count)
    }

    /// Append one record followed by a newline
    pub fn write_record(&mut self, record: &str) -> io::Result<()> {
        let mut block = String::with_capacity(record.len() + 1);
        block.push_str(record);
        block.push('\n');
        self.writer.write_all(block.as_bytes())?;
        self.writer.flush()
    }

    /// Re-open the active file after it was rewritten externally
    pub fn reopen(&mut self) -> io::Result<()> {
        let (writer, handle) = build_writer(&self.path, self.max_bytes, self.backup_count)?;
        self.writer = writer;
        self._handle = handle;
        Ok(())
    }
}

fn rotation_enabled(max_bytes: u64, backup_count: usize) -> bool {
    max_bytes > 0 && backup_count > 0
}

fn build_writer(
    path: &Path,
    max_bytes: u64,
    backup_count: usize,
) -> io::Result<(ArcFileLogWriter, FileLogWriterHandle)> {
    // Make sure the file exists before the first record arrives
    OpenOptions::new().create(true).append(true).open(path)?;

    let spec = FileSpec::try_from(path).map_err(to_io)?;
    let mut builder = FileLogWriter::builder(spec)
        .append()
        .write_mode(WriteMode::Direct);
    if rotation_enabled(max_bytes, backup_count) {
        builder = builder
            .rotate(
                Criterion::Size(max_bytes),
                Naming::NumbersDirect,
                Cleanup::KeepLogFiles(backup_count),
            )
            .cleanup_in_background_thread(false);
    }
    builder.try_build_with_handle().map_err(to_io)
}

fn to_io(err: FlexiLoggerError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn backups(path: &Path) -> Vec<PathBuf> {
        let dir = path.parent().unwrap();
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| is_backup_of(path, p))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_backup_path() {
        let path = Path::new("/var/log/app.log");
        assert_eq!(backup_path(path, 0), PathBuf::from("/var/log/app_r00000.log"));
        assert_eq!(backup_path(path, 12), PathBuf::from("/var/log/app_r00012.log"));
        assert_eq!(
            backup_path(Path::new("/var/log/app"), 3),
            PathBuf::from("/var/log/app_r00003")
        );
    }

    #[test]
    fn test_is_backup_of() {
        let log = Path::new("/var/log/app.log");
        assert!(is_backup_of(log, Path::new("/var/log/app_r00000.log")));
        assert!(is_backup_of(log, Path::new("/var/log/app_r42.log")));
        assert!(!is_backup_of(log, Path::new("/var/log/app.log")));
        assert!(!is_backup_of(log, Path::new("/var/log/app_r.log")));
        assert!(!is_backup_of(log, Path::new("/var/log/app_rCURRENT.log")));
        assert!(!is_backup_of(log, Path::new("/var/log/app_r00000.txt")));
        assert!(!is_backup_of(log, Path::new("/var/log/other_r00000.log")));

        let bare = Path::new("/var/log/app");
        assert!(is_backup_of(bare, Path::new("/var/log/app_r00001")));
        assert!(!is_backup_of(bare, Path::new("/var/log/app_r00001.log")));
    }

    #[test]
    fn test_open_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let file = RotatingFile::open(&path, 1_000, 3).unwrap();
        assert!(path.exists());
        assert!(file.rotation_enabled());
        assert_eq!(file.path(), path.as_path());
    }

    #[test]
    fn test_appends_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "existing\n").unwrap();

        let mut file = RotatingFile::open(&path, 1_000, 3).unwrap();
        file.write_record("first").unwrap();
        file.reopen().unwrap();
        file.write_record("second").unwrap();
        drop(file);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "existing\nfirst\nsecond\n"
        );
        assert!(backups(&path).is_empty());
    }

    #[test]
    fn test_rotates_and_keeps_backup_count() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let mut file = RotatingFile::open(&path, 10, 2).unwrap();
        for i in 0..20 {
            file.write_record(&format!("record-{i:02}")).unwrap();
        }
        drop(file);

        let found = backups(&path);
        assert!(!found.is_empty());
        assert!(found.len() <= 2);

        let active = fs::read_to_string(&path).unwrap();
        assert!(active.ends_with("record-19\n"));

        // The oldest records have been rotated out of existence
        let mut everything = active;
        for backup in &found {
            everything.push_str(&fs::read_to_string(backup).unwrap());
        }
        assert!(!everything.contains("record-00"));
    }

    #[test]
    fn test_zero_backup_count_disables_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");

        let mut file = RotatingFile::open(&path, 5, 0).unwrap();
        assert!(!file.rotation_enabled());
        file.write_record("long record").unwrap();
        file.write_record("another long record").unwrap();
        drop(file);

        assert!(backups(&path).is_empty());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "long record\nanother long record\n"
        );
    }
}
