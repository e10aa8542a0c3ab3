//! Physical destination kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical sink a writer represents.
///
/// Backends pick the encoding from this: human-readable for `Console`,
/// structured JSON for `File` and `RemoteTelemetry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    Console,
    RemoteTelemetry,
    File,
}

impl Output {
    /// Whether records for this output are encoded as structured key/value data
    #[must_use]
    pub fn is_structured(&self) -> bool {
        !matches!(self, Output::Console)
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Output::Console => "console",
            Output::RemoteTelemetry => "remote_telemetry",
            Output::File => "file",
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
