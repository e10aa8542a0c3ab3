//! Writer configuration
//!
//! `Config` holds everything the file and telemetry writers need. It can be
//! assembled from [`ConfigOpt`] values, through the `with_*` builder methods,
//! or deserialized from a host's own configuration file.

use super::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default rotating file location
pub const DEFAULT_FILE_PATH: &str = "./logs/app.log";
/// Default rotation threshold in megabytes
pub const DEFAULT_FILE_MAX_SIZE_MB: u64 = 150;
/// Default retention window in days
pub const DEFAULT_FILE_MAX_AGE_DAYS: u32 = 28;
/// Default number of rotated files kept
pub const DEFAULT_FILE_MAX_BACKUPS: usize = 7;
/// Log ingestion endpoint used when none is configured
pub const DEFAULT_TELEMETRY_ENDPOINT: &str = "https://log-api.newrelic.com/log/v1";
/// Exact length the ingestion service requires for a license key
pub const TELEMETRY_LICENSE_LEN: usize = 40;

/// Single configuration option
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOpt {
    /// Remote telemetry application identifier
    AppName(String),
    /// Remote telemetry license key
    License(String),
    /// Remote telemetry ingestion URL
    TelemetryEndpoint(String),
    /// Rotating file target path
    FilePath(PathBuf),
    /// Rotation threshold in megabytes
    FileSize(u64),
    /// Retention window in days
    FileAge(u32),
    /// Number of rotated files to keep
    FileMaxBackups(usize),
    /// Gzip rotated files
    FileCompress(bool),
}

/// Remote telemetry settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    app_name: String,
    license: String,
    endpoint: Option<String>,
}

impl TelemetryConfig {
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_TELEMETRY_ENDPOINT)
    }
}

/// Rotating file settings. Zero or empty values mean "use the default".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    path: Option<PathBuf>,
    max_size_mb: u64,
    max_age_days: u32,
    max_backups: usize,
    compress: bool,
}

impl FileConfig {
    pub fn path(&self) -> &Path {
        match &self.path {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new(DEFAULT_FILE_PATH),
        }
    }

    pub fn max_size_mb(&self) -> u64 {
        if self.max_size_mb == 0 {
            DEFAULT_FILE_MAX_SIZE_MB
        } else {
            self.max_size_mb
        }
    }

    pub fn max_age_days(&self) -> u32 {
        if self.max_age_days == 0 {
            DEFAULT_FILE_MAX_AGE_DAYS
        } else {
            self.max_age_days
        }
    }

    pub fn max_backups(&self) -> usize {
        if self.max_backups == 0 {
            DEFAULT_FILE_MAX_BACKUPS
        } else {
            self.max_backups
        }
    }

    pub fn compress(&self) -> bool {
        self.compress
    }
}

/// Configuration shared by the writers that need one
///
/// # Examples
///
/// ```
/// use unified_logger::{Config, ConfigOpt};
///
/// let cfg = Config::new([
///     ConfigOpt::FilePath("/tmp/svc/app.log".into()),
///     ConfigOpt::FileSize(10),
/// ]);
/// assert_eq!(cfg.file().max_size_mb(), 10);
/// assert_eq!(cfg.file().max_backups(), 7);
///
/// let cfg = Config::default()
///     .with_app_name("billing")
///     .with_file_max_backups(3);
/// assert_eq!(cfg.telemetry().app_name(), "billing");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    telemetry: TelemetryConfig,
    file: FileConfig,
}

impl Config {
    /// Build a config by applying options in order
    pub fn new(opts: impl IntoIterator<Item = ConfigOpt>) -> Self {
        let mut config = Self::default();
        for opt in opts {
            config.apply(opt);
        }
        config
    }

    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn apply(&mut self, opt: ConfigOpt) {
        match opt {
            ConfigOpt::AppName(name) => self.telemetry.app_name = name,
            ConfigOpt::License(license) => self.telemetry.license = license,
            ConfigOpt::TelemetryEndpoint(url) => self.telemetry.endpoint = Some(url),
            ConfigOpt::FilePath(path) => self.file.path = Some(path),
            ConfigOpt::FileSize(mb) => self.file.max_size_mb = mb,
            ConfigOpt::FileAge(days) => self.file.max_age_days = days,
            ConfigOpt::FileMaxBackups(n) => self.file.max_backups = n,
            ConfigOpt::FileCompress(enabled) => self.file.compress = enabled,
        }
    }

    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.telemetry
    }

    pub fn file(&self) -> &FileConfig {
        &self.file
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.apply(ConfigOpt::AppName(name.into()));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.apply(ConfigOpt::License(license.into()));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_telemetry_endpoint(mut self, url: impl Into<String>) -> Self {
        self.apply(ConfigOpt::TelemetryEndpoint(url.into()));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.apply(ConfigOpt::FilePath(path.into()));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file_size(mut self, mb: u64) -> Self {
        self.apply(ConfigOpt::FileSize(mb));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file_age(mut self, days: u32) -> Self {
        self.apply(ConfigOpt::FileAge(days));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file_max_backups(mut self, count: usize) -> Self {
        self.apply(ConfigOpt::FileMaxBackups(count));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file_compress(mut self, enabled: bool) -> Self {
        self.apply(ConfigOpt::FileCompress(enabled));
        self
    }
}
