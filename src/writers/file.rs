//! Rotating file writer
//!
//! The file is opened lazily on the first record, so constructing a
//! [`FileWriter`] never touches the filesystem. When the next record would
//! push the file past its size limit the file is renamed to `<name>.1`, older
//! backups shift up by one, and backups beyond the retention count or older
//! than the retention age are removed. Flushing closes the file for good.

use crate::core::config::{Config, FileConfig};
use crate::core::error::{LoggerError, Result};
use crate::core::{Level, Output, Sink, SinkTarget, Writer};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const BYTES_PER_MB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// When and how to rotate
///
/// # Examples
///
/// ```
/// use unified_logger::writers::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(policy.max_backup_files, 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    /// Size in bytes a file may reach before rotating
    pub max_bytes: u64,
    /// Maximum number of rotated files to keep
    pub max_backup_files: usize,
    /// Rotated files older than this are removed
    pub max_age: Option<Duration>,
    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::from_config(&FileConfig::default())
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy matching a file configuration's (defaulted) values
    #[must_use]
    pub fn from_config(config: &FileConfig) -> Self {
        Self {
            max_bytes: config.max_size_mb().saturating_mul(BYTES_PER_MB),
            max_backup_files: config.max_backups(),
            max_age: Some(Duration::from_secs(
                u64::from(config.max_age_days()) * SECS_PER_DAY,
            )),
            compress: config.compress(),
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backup_files = count;
        self
    }

    /// Remove rotated files older than `age`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    /// Keep rotated files regardless of age
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn without_max_age(mut self) -> Self {
        self.max_age = None;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

struct FileState {
    writer: Option<BufWriter<File>>,
    current_size: u64,
    closed: bool,
    /// Counter for consecutive deletion failures (reset on successful deletion)
    deletion_failure_count: usize,
}

/// Size-rotated file target shared between a [`FileWriter`] and its loggers
pub struct RotatingFile {
    base_path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<FileState>,
}

impl RotatingFile {
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Self {
        Self {
            base_path: path.as_ref().to_path_buf(),
            policy,
            state: Mutex::new(FileState {
                writer: None,
                current_size: 0,
                closed: false,
                deletion_failure_count: 0,
            }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Bytes in the active file, as far as this process knows
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Flush and close the file. Terminal; later writes fail.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.closed = true;
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush on close: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn open(&self) -> Result<(BufWriter<File>, u64)> {
        if let Some(parent) = self.base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.base_path)
            .map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok((BufWriter::new(file), size))
    }

    fn rotate(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let max_backups = self.policy.max_backup_files;
        if max_backups == 0 {
            if self.base_path.exists() {
                fs::remove_file(&self.base_path).map_err(|e| {
                    LoggerError::file_rotation(
                        self.base_path.display().to_string(),
                        format!("Failed to discard full log file: {}", e),
                    )
                })?;
            }
        } else {
            self.remove_oldest(state, max_backups)?;

            for i in (1..max_backups).rev() {
                let old_path = self.backup_path(i);
                let new_path = self.backup_path(i + 1);
                let old_compressed = gz_path(&old_path);

                if old_compressed.exists() {
                    rename_replacing(&old_compressed, &gz_path(&new_path))?;
                } else if old_path.exists() {
                    rename_replacing(&old_path, &new_path)?;
                }
            }

            let backup_path = self.backup_path(1);
            if self.base_path.exists() {
                fs::rename(&self.base_path, &backup_path).map_err(|e| {
                    LoggerError::file_rotation(
                        self.base_path.display().to_string(),
                        format!("Failed to rotate current log file: {}", e),
                    )
                })?;

                if self.policy.compress {
                    self.compress_file(&backup_path)?;
                }
            }

            self.prune_expired();
        }

        let (writer, size) = self.open()?;
        state.writer = Some(writer);
        state.current_size = size;
        Ok(())
    }

    /// Delete the backup that the upcoming shift would push past the limit
    fn remove_oldest(&self, state: &mut FileState, max_backups: usize) -> Result<()> {
        const MAX_DELETION_FAILURES: usize = 5;

        let oldest = self.backup_path(max_backups);
        let mut deletion_failed = false;
        for candidate in [gz_path(&oldest), oldest] {
            if candidate.exists() {
                if let Err(e) = fs::remove_file(&candidate) {
                    deletion_failed = true;
                    eprintln!(
                        "[WARN] Failed to remove oldest backup {}: {} (failure #{}/{})",
                        candidate.display(),
                        e,
                        state.deletion_failure_count + 1,
                        MAX_DELETION_FAILURES
                    );
                }
            }
        }

        if !deletion_failed {
            state.deletion_failure_count = 0;
            return Ok(());
        }

        state.deletion_failure_count += 1;
        if state.deletion_failure_count >= MAX_DELETION_FAILURES {
            return Err(LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!(
                    "Rotation aborted: failed to delete old backup files {} consecutive times",
                    state.deletion_failure_count
                ),
            ));
        }
        Ok(())
    }

    /// Remove backups whose modification time is past the retention age
    fn prune_expired(&self) {
        let Some(max_age) = self.policy.max_age else {
            return;
        };
        let now = SystemTime::now();

        for i in 1..=self.policy.max_backup_files {
            let plain = self.backup_path(i);
            for candidate in [gz_path(&plain), plain] {
                let expired = fs::metadata(&candidate)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > max_age);

                if expired {
                    if let Err(e) = fs::remove_file(&candidate) {
                        eprintln!(
                            "[WARN] Failed to remove expired backup {}: {}",
                            candidate.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    /// Backup file path for a given index: `app.log` -> `app.log.3`
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    /// Gzip a rotated file, replacing it only once compression succeeded
    fn compress_file(&self, path: &Path) -> Result<()> {
        use std::io::{BufReader, Read};

        let gz = gz_path(path);
        let mut temp_name = gz.clone().into_os_string();
        temp_name.push(".tmp");
        let temp_gz = PathBuf::from(temp_name);

        let input = File::open(path).map_err(|e| {
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to open file for compression: {}", path.display()),
                e,
            )
        })?;
        let mut reader = BufReader::with_capacity(64 * 1024, input);

        let output = File::create(&temp_gz).map_err(|e| {
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to create temporary compressed file: {}", temp_gz.display()),
                e,
            )
        })?;
        let mut encoder = flate2::write::GzEncoder::new(
            BufWriter::with_capacity(64 * 1024, output),
            flate2::Compression::default(),
        );

        let streamed = (|| -> std::io::Result<()> {
            let mut buffer = vec![0u8; 64 * 1024];
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                encoder.write_all(&buffer[..bytes_read])?;
            }
            encoder.finish()?.flush()
        })();

        if let Err(e) = streamed.and_then(|()| fs::rename(&temp_gz, &gz)) {
            let _ = fs::remove_file(&temp_gz);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress {}", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[WARN] Compression succeeded but failed to remove original file {}: {}",
                path.display(),
                e
            );
        }
        Ok(())
    }
}

impl SinkTarget for RotatingFile {
    fn write_record(&self, buf: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(LoggerError::writer_closed("file"));
        }

        if state.writer.is_none() {
            let (writer, size) = self.open()?;
            state.writer = Some(writer);
            state.current_size = size;
        }

        let incoming = buf.len() as u64;
        if state.current_size > 0 && state.current_size + incoming > self.policy.max_bytes {
            if let Err(e) = self.rotate(&mut state) {
                eprintln!("[WARN] Log rotation failed: {}. Continuing with current file.", e);

                if state.writer.is_none() {
                    let (writer, size) = self.open()?;
                    state.writer = Some(writer);
                    state.current_size = size;
                }
                // Let the file grow past the limit rather than retry on every record
                state.current_size = 0;
            }
        }

        let FileState {
            writer,
            current_size,
            ..
        } = &mut *state;
        match writer {
            Some(writer) => {
                writer.write_all(buf).map_err(|e| {
                    LoggerError::file_appender(
                        self.base_path.display().to_string(),
                        format!("Failed to write log entry: {}", e),
                    )
                })?;
                *current_size += incoming;
                Ok(())
            }
            None => Err(LoggerError::writer("File not open")),
        }
    }

    fn sync(&self) -> Result<()> {
        if let Some(writer) = self.state.lock().writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        if let Some(mut writer) = self.state.get_mut().writer.take() {
            let _ = writer.flush();
        }
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

fn rename_replacing(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Some platforms refuse to rename onto an existing file.
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).map_err(|e| {
        LoggerError::file_rotation(
            from.display().to_string(),
            format!("Failed to rotate backup files: {}", e),
        )
    })
}

/// Structured-output writer over a [`RotatingFile`]
///
/// # Example
///
/// ```no_run
/// use unified_logger::prelude::*;
///
/// let cfg = Config::default().with_file_path("/var/log/svc/app.log");
/// let writer = FileWriter::new(Level::Info, &cfg);
/// assert_eq!(writer.output(), Output::File);
/// ```
pub struct FileWriter {
    level: Level,
    file: Arc<RotatingFile>,
}

impl FileWriter {
    /// Writer using the file section of `config`. Does not open the file.
    pub fn new(level: Level, config: &Config) -> Self {
        let file_config = config.file();
        Self::with_policy(
            level,
            file_config.path(),
            RotationPolicy::from_config(file_config),
        )
    }

    pub fn with_policy<P: AsRef<Path>>(level: Level, path: P, policy: RotationPolicy) -> Self {
        Self {
            level,
            file: Arc::new(RotatingFile::new(path, policy)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    #[must_use]
    pub fn file(&self) -> &RotatingFile {
        &self.file
    }
}

impl Writer for FileWriter {
    fn sink(&self) -> Sink {
        Sink::new(self.file.clone())
    }

    fn output(&self) -> Output {
        Output::File
    }

    fn level(&self) -> Level {
        self.level
    }

    /// Closes the file; the writer accepts nothing afterwards.
    fn flush(&self, _timeout: Duration) -> Result<()> {
        self.file.close()
    }

    fn name(&self) -> &str {
        "file"
    }
}
