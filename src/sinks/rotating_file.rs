//! Rotating file sink
//!
//! The destination path is a template: `%DATE%` in the file name is
//! rendered with the configured date pattern whenever the file is opened.
//! The file is opened on first write, rotated into numbered backups
//! (`app.log.1`, `app.log.2`, ...) once it reaches the size threshold, and
//! old backups are pruned by count or by age.

use crate::config::Retention;
use crate::core::{LoggerError, Result, Sink, TimestampFormat, WriteMeta};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Placeholder replaced by the formatted open date
pub const DATE_PLACEHOLDER: &str = "%DATE%";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const COMPRESSED_SUFFIX: &str = ".gz";

/// Where a rotating file lives
#[derive(Debug, Clone)]
pub struct FileTemplate {
    pub dir: PathBuf,
    /// File stem, may contain `%DATE%`
    pub file_name: String,
    /// Extension without the dot; empty for none
    pub ext: String,
    pub date_format: TimestampFormat,
}

impl FileTemplate {
    pub fn new(
        dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        ext: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
            ext: ext.into(),
            date_format: TimestampFormat::from_dayjs("YYYY-MM-DD"),
        }
    }

    #[must_use]
    pub fn with_date_format(mut self, format: TimestampFormat) -> Self {
        self.date_format = format;
        self
    }

    /// Path of the file opened now
    pub fn resolve(&self) -> PathBuf {
        let date = self.date_format.format(&Local::now());
        let mut name = self.file_name.replace(DATE_PLACEHOLDER, &date);
        if !self.ext.is_empty() {
            name.push('.');
            name.push_str(&self.ext);
        }
        self.dir.join(name)
    }
}

/// When to rotate and what to keep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub retention: Retention,
    pub compress: bool,
    /// Flush after every record so nothing is held in memory at exit
    pub flush_each_write: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            retention: Retention::Days(10),
            compress: false,
            flush_each_write: true,
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
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_flush_each_write(mut self, enabled: bool) -> Self {
        self.flush_each_write = enabled;
        self
    }
}

pub struct RotatingFileSink {
    template: FileTemplate,
    policy: RotationPolicy,
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RotatingFileSink {
    /// Create the sink; nothing is opened until the first write
    pub fn new(template: FileTemplate, policy: RotationPolicy) -> Self {
        Self {
            template,
            policy,
            path: None,
            writer: None,
            current_size: 0,
        }
    }

    pub fn template(&self) -> &FileTemplate {
        &self.template
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Path of the open file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn open(path: &Path) -> Result<(BufWriter<File>, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
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
        Ok((BufWriter::new(file), size))
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }
        let path = self.template.resolve();
        let (writer, size) = Self::open(&path)?;
        self.writer = Some(writer);
        self.current_size = size;
        self.path = Some(path);
        Ok(())
    }

    fn should_rotate(&self) -> bool {
        self.writer.is_some() && self.current_size >= self.policy.max_bytes
    }

    fn rotate(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let mut backups = existing_backups(&path);
        backups.sort_by(|a, b| b.index.cmp(&a.index));
        for backup in &backups {
            let shifted = backup_path(&path, backup.index + 1, backup.compressed);
            fs::rename(&backup.path, &shifted).map_err(|e| {
                LoggerError::file_rotation(
                    backup.path.display().to_string(),
                    format!("Failed to rotate backup files: {}", e),
                )
            })?;
        }

        if path.exists() {
            let first = backup_path(&path, 1, false);
            fs::rename(&path, &first).map_err(|e| {
                LoggerError::file_rotation(
                    path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
            if self.policy.compress {
                compress_file(&first)?;
            }
        }

        self.prune(&path);

        let next = self.template.resolve();
        let (writer, size) = Self::open(&next).map_err(|e| {
            LoggerError::file_rotation(next.display().to_string(), e.to_string())
        })?;
        self.writer = Some(writer);
        self.current_size = size;
        self.path = Some(next);
        Ok(())
    }

    /// Delete backups outside the retention window
    fn prune(&self, path: &Path) {
        let now = SystemTime::now();
        for backup in existing_backups(path) {
            let expired = match self.policy.retention {
                Retention::Count(max) => backup.index > max,
                Retention::Days(days) => fs::metadata(&backup.path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > retention_window(days)),
            };
            if expired {
                if let Err(e) = fs::remove_file(&backup.path) {
                    eprintln!(
                        "[WARN] Failed to remove expired backup {}: {}",
                        backup.path.display(),
                        e
                    );
                }
            }
        }
    }
}

/// Age after which a backup is pruned; saturates instead of overflowing
fn retention_window(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY))
}

impl Sink for RotatingFileSink {
    fn write(&mut self, chunk: &str, _meta: &WriteMeta) -> Result<()> {
        self.ensure_open()?;

        if self.should_rotate() {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[WARN] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if self.writer.is_none() {
                    let Some(path) = self.path.clone() else {
                        return Err(e);
                    };
                    match Self::open(&path) {
                        Ok((writer, _)) => self.writer = Some(writer),
                        Err(reopen_err) => {
                            eprintln!(
                                "[LOGGER ERROR] Failed to reopen log file after rotation: {}",
                                reopen_err
                            );
                            return Err(e);
                        }
                    }
                }
                // let the file outgrow the limit rather than retry on every write
                self.current_size = 0;
            }
        }

        let Some(ref mut writer) = self.writer else {
            return Err(LoggerError::sink_write("file", "writer not initialized"));
        };
        writer.write_all(chunk.as_bytes()).map_err(|e| {
            LoggerError::file_sink(
                self.path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.current_size += chunk.len() as u64;
        if self.policy.flush_each_write {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
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

struct Backup {
    path: PathBuf,
    index: usize,
    compressed: bool,
}

fn backup_path(path: &Path, index: usize, compressed: bool) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = if compressed { COMPRESSED_SUFFIX } else { "" };
    path.with_file_name(format!("{}.{}{}", name, index, suffix))
}

/// Numbered backups of `path`, in no particular order
fn existing_backups(path: &Path) -> Vec<Backup> {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return Vec::new();
    };
    let prefix = format!("{}.", name.to_string_lossy());
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let rest = file_name.strip_prefix(&prefix)?;
            let (digits, compressed) = match rest.strip_suffix(COMPRESSED_SUFFIX) {
                Some(digits) => (digits, true),
                None => (rest, false),
            };
            let index = digits.parse::<usize>().ok()?;
            Some(Backup {
                path: entry.path(),
                index,
                compressed,
            })
        })
        .collect()
}

/// Gzip `path` next to itself, removing the original only on success
fn compress_file(path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let gz_path = path.with_file_name(format!("{}{}", name, COMPRESSED_SUFFIX));
    let temp_gz_path = path.with_file_name(format!("{}{}.tmp", name, COMPRESSED_SUFFIX));

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);
    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let mut buffer = vec![0u8; 64 * 1024];
    let streamed: std::io::Result<()> = (|| {
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            encoder.write_all(&buffer[..bytes_read])?;
        }
        encoder.finish()?.flush()
    })();
    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[WARN] Compression succeeded but failed to remove original file {}: {}.",
            path.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LogRecord, LoggerHooks, LoggerInstance};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn meta() -> WriteMeta {
        WriteMeta::new(
            Arc::new(LogRecord::new("test", LogLevel::Info)),
            Arc::new(LoggerInstance::new("test", LoggerHooks::default())),
        )
    }

    #[test]
    fn test_template_resolves_date() {
        let template = FileTemplate::new("/var/log/app", "Error-%DATE%", "log")
            .with_date_format(TimestampFormat::from_dayjs("YYYY"));
        let path = template.resolve();
        let expected = format!("Error-{}.log", Local::now().format("%Y"));
        assert_eq!(path, PathBuf::from("/var/log/app").join(expected));

        let bare = FileTemplate::new("logs", "Payments", "");
        assert_eq!(bare.resolve(), PathBuf::from("logs").join("Payments"));
    }

    #[test]
    fn test_file_opened_lazily() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(
            FileTemplate::new(dir.path(), "Lazy", "log"),
            RotationPolicy::default(),
        );
        assert!(sink.path().is_none());
        assert!(!dir.path().join("Lazy.log").exists());

        sink.write("{\"message\":\"first\"}\n", &meta()).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.path(), Some(dir.path().join("Lazy.log").as_path()));
        let content = fs::read_to_string(dir.path().join("Lazy.log")).unwrap();
        assert_eq!(content, "{\"message\":\"first\"}\n");
    }

    #[test]
    fn test_missing_directory_fails_per_write() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(
            FileTemplate::new(dir.path().join("absent"), "X", "log"),
            RotationPolicy::default(),
        );
        assert!(sink.write("line\n", &meta()).is_err());
    }

    #[test]
    fn test_size_rotation_keeps_count() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new()
            .with_max_size(64)
            .with_retention(Retention::Count(2));
        let template = FileTemplate::new(dir.path(), "Rotation", "log");
        let mut sink = RotatingFileSink::new(template, policy);

        for i in 0..40 {
            sink.write(&format!("Test message number {}\n", i), &meta()).unwrap();
        }
        sink.flush().unwrap();

        let base = dir.path().join("Rotation.log");
        assert!(base.exists());
        assert!(backup_path(&base, 1, false).exists());
        assert!(backup_path(&base, 2, false).exists());
        assert!(!backup_path(&base, 3, false).exists());
    }

    #[test]
    fn test_rotation_with_compression() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new()
            .with_max_size(32)
            .with_retention(Retention::Count(3))
            .with_compression(true);
        let mut sink = RotatingFileSink::new(FileTemplate::new(dir.path(), "Gz", "log"), policy);

        for i in 0..10 {
            sink.write(&format!("compressible line {}\n", i), &meta()).unwrap();
        }
        sink.flush().unwrap();

        let base = dir.path().join("Gz.log");
        let gz = backup_path(&base, 1, true);
        assert!(gz.exists());
        assert!(!backup_path(&base, 1, false).exists());

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("compressible line"));
    }

    #[test]
    fn test_day_retention_keeps_fresh_backups() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new()
            .with_max_size(10)
            .with_retention(Retention::Days(1));
        let mut sink = RotatingFileSink::new(FileTemplate::new(dir.path(), "Days", "log"), policy);

        for i in 0..6 {
            sink.write(&format!("fresh entry {}\n", i), &meta()).unwrap();
        }
        sink.flush().unwrap();

        let backups = existing_backups(&dir.path().join("Days.log"));
        assert_eq!(backups.len(), 5);
    }

    #[test]
    fn test_records_reach_disk_without_flush() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(
            FileTemplate::new(dir.path(), "Unflushed", "log"),
            RotationPolicy::default(),
        );
        sink.write("{\"message\":\"kept\"}\n", &meta()).unwrap();

        let content = fs::read_to_string(dir.path().join("Unflushed.log")).unwrap();
        assert_eq!(content, "{\"message\":\"kept\"}\n");
        // the sink is still open and owns the file
        assert!(sink.path().is_some());
    }

    #[test]
    fn test_retention_window_saturates() {
        assert_eq!(retention_window(2), Duration::from_secs(2 * SECONDS_PER_DAY));
        assert_eq!(retention_window(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
