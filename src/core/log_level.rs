//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered log severity.
///
/// `Invalid` is what [`Level::parse`] yields for unrecognized input. It sorts
/// below every real level and a writer configured with it accepts nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Level {
    Invalid = -1,
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    /// Parse a level leniently, returning [`Level::Invalid`] instead of an error.
    ///
    /// Case-insensitive; accepts `debug`, `info`, `warn`/`warning` and
    /// `error`/`err`.
    ///
    /// # Examples
    ///
    /// ```
    /// use unified_logger::Level;
    ///
    /// assert_eq!(Level::parse("WARNING"), Level::Warn);
    /// assert_eq!(Level::parse("err"), Level::Error);
    /// assert_eq!(Level::parse("verbose"), Level::Invalid);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warning" | "warn" => Level::Warn,
            "error" | "err" => Level::Error,
            _ => Level::Invalid,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Level::Invalid => "INVALID",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        *self != Level::Invalid
    }

    /// Whether a writer configured at `self` accepts an event at `event`.
    #[must_use]
    pub fn enabled(&self, event: Level) -> bool {
        self.is_valid() && event.is_valid() && event >= *self
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Invalid => BrightBlack,
            Level::Debug => Magenta,
            Level::Info => Blue,
            Level::Warn => Yellow,
            Level::Error => Red,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Level::parse(s) {
            Level::Invalid => Err(format!("Invalid log level: '{}'", s)),
            level => Ok(level),
        }
    }
}
