//! Size-based rotating JSON file sink
//!
//! The active file keeps its configured name. When the next record would push
//! it past the size limit, it is renamed to a timestamped backup
//! (`app-2025-01-08T10-30-45.123456.log`), optionally gzip-compressed, and a
//! fresh file is opened. Old backups are pruned oldest first.

use crate::core::{Encoder, JsonEncoder, LogRecord, LoggerError, Result, Sink};
use chrono::{Duration, Local, NaiveDateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6f";
const BACKUP_TIME_PARSE_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.f";
const COMPRESSED_SUFFIX: &str = ".gz";

/// Default active file limit: 1024 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024 * 1024;

/// When to rotate and what to keep afterwards.
///
/// # Example
///
/// ```
/// use teelog::sinks::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_compression(true);
/// assert!(policy.local_time);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size limit of the active file in bytes
    pub max_bytes: u64,
    /// Backups to keep; 0 keeps all of them
    pub max_backups: usize,
    /// Gzip rotated files
    pub compress: bool,
    /// Stamp backup names with local time instead of UTC
    pub local_time: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_backups: 5,
            compress: false,
            local_time: true,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_local_time(mut self, enabled: bool) -> Self {
        self.local_time = enabled;
        self
    }
}

/// JSONL file sink with size-based rotation
///
/// # Examples
///
/// ```no_run
/// use teelog::sinks::{RotatingFileSink, RotationPolicy};
///
/// let policy = RotationPolicy::new().with_max_size(10 * 1024 * 1024);
/// let sink = RotatingFileSink::with_policy("/var/log/app/app.log", policy).unwrap();
/// ```
pub struct RotatingFileSink {
    base_path: PathBuf,
    policy: RotationPolicy,
    encoder: JsonEncoder,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RotatingFileSink {
    /// Create a sink with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or the file cannot be created
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Create a sink with a custom policy
    ///
    /// An existing file is appended to, and its size counts toward the limit.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or the file cannot be created
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open_active(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            encoder: JsonEncoder::new(),
            writer: Some(BufWriter::new(file)),
            current_size,
        })
    }

    fn open_active(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        Ok((file, size))
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        self.current_size > 0 && self.current_size + incoming > self.policy.max_bytes
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let backup = self.next_backup_path();
        fs::rename(&self.base_path, &backup).map_err(|e| {
            LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Failed to move active file to '{}': {}", backup.display(), e),
            )
        })?;

        let (file, size) = Self::open_active(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        if self.policy.compress {
            if let Err(e) = compress_file(&backup) {
                eprintln!("[teelog] keeping uncompressed backup: {}", e);
            }
        }

        self.prune_backups();
        Ok(())
    }

    /// `(stem, extension)` of the active file name; the extension keeps its dot.
    fn name_parts(&self) -> (String, String) {
        let stem = self
            .base_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("app")
            .to_string();
        let ext = self
            .base_path
            .extension()
            .and_then(|s| s.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        (stem, ext)
    }

    fn backup_path_at(&self, stamp: &NaiveDateTime) -> PathBuf {
        let (stem, ext) = self.name_parts();
        self.base_path.with_file_name(format!(
            "{}-{}{}",
            stem,
            stamp.format(BACKUP_TIME_FORMAT),
            ext
        ))
    }

    /// Backup name for "now"; bumped by a microsecond until it is unused.
    fn next_backup_path(&self) -> PathBuf {
        let mut stamp = if self.policy.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        };

        loop {
            let candidate = self.backup_path_at(&stamp);
            if !candidate.exists() && !with_suffix(&candidate, COMPRESSED_SUFFIX).exists() {
                return candidate;
            }
            stamp += Duration::microseconds(1);
        }
    }

    /// Existing backups of this file, oldest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        let dir = match self.base_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (stem, ext) = self.name_parts();
        let prefix = format!("{}-", stem);

        let mut found = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            let stamp = name
                .strip_prefix(&prefix)
                .map(|rest| rest.strip_suffix(COMPRESSED_SUFFIX).unwrap_or(rest))
                .and_then(|rest| rest.strip_suffix(ext.as_str()))
                .and_then(|ts| NaiveDateTime::parse_from_str(ts, BACKUP_TIME_PARSE_FORMAT).ok());

            if let Some(stamp) = stamp {
                found.push((stamp, entry.path()));
            }
        }

        found.sort();
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    fn prune_backups(&self) {
        if self.policy.max_backups == 0 {
            return;
        }

        let backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                eprintln!("[teelog] cannot list backups of '{}': {}", self.base_path.display(), e);
                return;
            }
        };

        let excess = backups.len().saturating_sub(self.policy.max_backups);
        for old in &backups[..excess] {
            if let Err(e) = fs::remove_file(old) {
                eprintln!("[teelog] failed to remove old backup {}: {}", old.display(), e);
            }
        }
    }

    /// Reopen the active file after a failed rotation left no writer behind.
    fn recover_writer(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let (file, size) = Self::open_active(&self.base_path)?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = size;
        }
        Ok(())
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Gzip `path` into `<path>.gz` through a temporary file.
///
/// The original is only removed once the compressed file is complete.
fn compress_file(path: &Path) -> Result<()> {
    let gz_path = with_suffix(path, COMPRESSED_SUFFIX);
    let temp_path = with_suffix(path, ".gz.tmp");

    let result = (|| -> io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&temp_path)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp_path, &gz_path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[teelog] compressed {} but could not remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

impl Sink for RotatingFileSink {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        let mut buf = Vec::with_capacity(256);
        self.encoder.encode(record, &mut buf)?;
        let incoming = buf.len() as u64;

        if self.should_rotate(incoming) {
            if let Err(e) = self.rotate() {
                eprintln!("[teelog] log rotation failed: {}. Continuing with current file.", e);
                self.recover_writer().map_err(|_| e)?;
                // Let the file grow rather than retry on every record.
                self.current_size = 0;
            }
        }

        let writer = self.writer.as_mut().ok_or_else(|| {
            LoggerError::file_sink(self.base_path.display().to_string(), "writer not initialized")
        })?;
        writer.write_all(&buf).map_err(|e| {
            LoggerError::file_sink(
                self.base_path.display().to_string(),
                format!("Failed to write log record: {}", e),
            )
        })?;
        self.current_size += incoming;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Fields, LogLevel};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    fn record(i: usize) -> LogRecord {
        LogRecord::new(LogLevel::Info, format!("Test message number {}", i))
            .with_fields(Fields::new().with("i", i))
    }

    #[test]
    fn test_sink_creation() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested/deeper/test.log");

        let sink = RotatingFileSink::new(&log_path).unwrap();
        assert_eq!(sink.path(), log_path);
        assert_eq!(sink.current_size(), 0);
        assert!(log_path.exists());
    }

    #[test]
    fn test_existing_file_size_is_counted() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("existing.log");
        fs::write(&log_path, b"0123456789").unwrap();

        let sink = RotatingFileSink::new(&log_path).unwrap();
        assert_eq!(sink.current_size(), 10);
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("json.log");
        let mut sink = RotatingFileSink::new(&log_path).unwrap();

        sink.write(&record(1)).unwrap();
        sink.write(&record(2)).unwrap();
        sink.sync().unwrap();

        let text = fs::read_to_string(&log_path).unwrap();
        let decoded: Vec<LogRecord> = text
            .lines()
            .map(|line| JsonEncoder::decode(line.as_bytes()).unwrap())
            .collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].message, "Test message number 2");
    }

    #[test]
    fn test_rotation_keeps_bounded_backups() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("rotation.log");
        let policy = RotationPolicy::new().with_max_size(1024).with_max_backups(5);
        let mut sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        let mut written = 0;
        let mut i = 0;
        while written < 5000 {
            let next = record(i);
            let mut encoded = Vec::new();
            JsonEncoder::new().encode(&next, &mut encoded).unwrap();
            written += encoded.len();
            sink.write(&next).unwrap();
            i += 1;
        }
        sink.sync().unwrap();

        let backups = sink.backups().unwrap();
        assert!(!backups.is_empty());
        assert!(backups.len() <= 5);
        assert!(sink.current_size() <= 1024);
        assert!(log_path.exists());
    }

    #[test]
    fn test_oldest_backups_are_removed() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("prune.log");
        let policy = RotationPolicy::new().with_max_size(64).with_max_backups(2);
        let mut sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        for i in 0..40 {
            sink.write(&record(i)).unwrap();
        }
        sink.sync().unwrap();

        let backups = sink.backups().unwrap();
        assert_eq!(backups.len(), 2);

        // The survivors are the two most recent ones.
        let newest = fs::read_to_string(&backups[1]).unwrap();
        assert!(newest.contains("Test message number 38"));
    }

    #[test]
    fn test_oversized_record_goes_to_empty_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("big.log");
        let policy = RotationPolicy::new().with_max_size(16);
        let mut sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        sink.write(&record(0)).unwrap();
        assert!(sink.backups().unwrap().is_empty());

        sink.write(&record(1)).unwrap();
        assert_eq!(sink.backups().unwrap().len(), 1);
    }

    #[test]
    fn test_zero_max_backups_keeps_all() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("all.log");
        let policy = RotationPolicy::new().with_max_size(16).with_max_backups(0);
        let mut sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        for i in 0..8 {
            sink.write(&record(i)).unwrap();
        }
        assert_eq!(sink.backups().unwrap().len(), 7);
    }

    #[test]
    fn test_compressed_backups() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("zip.log");
        let policy = RotationPolicy::new()
            .with_max_size(16)
            .with_compression(true)
            .with_local_time(false);
        let mut sink = RotatingFileSink::with_policy(&log_path, policy).unwrap();

        sink.write(&record(0)).unwrap();
        sink.write(&record(1)).unwrap();

        let backups = sink.backups().unwrap();
        assert_eq!(backups.len(), 1);
        let name = backups[0].file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("zip-"));
        assert!(name.ends_with(".log.gz"));

        let mut text = String::new();
        GzDecoder::new(File::open(&backups[0]).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert!(text.contains("Test message number 0"));

        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_unrelated_files_are_not_backups() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("app.log");
        fs::write(dir.path().join("app-notes.log"), b"keep me").unwrap();
        fs::write(dir.path().join("other.log"), b"keep me").unwrap();

        let sink = RotatingFileSink::new(&log_path).unwrap();
        assert!(sink.backups().unwrap().is_empty());
    }
}
