//! A single log event on its way to the encoders

use super::chain::FieldChain;
use super::field::Field;
use super::log_level::Level;
use chrono::{DateTime, Utc};

/// Borrowed view of one log event
///
/// Context lineage comes first, then call-site fields, matching the order a
/// reader expects: the more specific the later.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub context: &'a FieldChain,
    pub fields: &'a [Field],
}

impl<'a> Record<'a> {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so one call always produces one line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: Level, message: &str, context: &'a FieldChain, fields: &'a [Field]) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message),
            timestamp: Utc::now(),
            context,
            fields,
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_single_line() {
        let chain = FieldChain::new();
        let record = Record::new(Level::Info, "a\nb\r\tc", &chain, &[]);
        assert_eq!(record.message, "a\\nb\\r\\tc");
    }
}
