//! Console writer implementation

use crate::core::{Level, Output, Result, Sink, Writer};
use std::io;
use std::time::Duration;

/// Writes human-readable lines to standard output
///
/// # Example
///
/// ```
/// use unified_logger::prelude::*;
///
/// let writer = ConsoleWriter::new(Level::Debug);
/// assert_eq!(writer.output(), Output::Console);
/// ```
pub struct ConsoleWriter {
    level: Level,
    sink: Sink,
}

impl ConsoleWriter {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            sink: Sink::from_writer(io::stdout()),
        }
    }

    /// Console writer on standard error instead
    pub fn stderr(level: Level) -> Self {
        Self {
            level,
            sink: Sink::from_writer(io::stderr()),
        }
    }
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::new(Level::default())
    }
}

impl Writer for ConsoleWriter {
    fn sink(&self) -> Sink {
        self.sink.clone()
    }

    fn output(&self) -> Output {
        Output::Console
    }

    fn level(&self) -> Level {
        self.level
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        // The process streams stay open.
        self.sink.sync()
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_writer_contract() {
        let writer = ConsoleWriter::new(Level::Warn);
        assert_eq!(writer.level(), Level::Warn);
        assert_eq!(writer.output(), Output::Console);
        assert!(writer.wait(Duration::ZERO));
        assert!(writer.sink().same_target(&writer.sink()));
        writer.flush(Duration::ZERO).unwrap();
        writer.flush(Duration::ZERO).unwrap();
    }

    #[test]
    fn test_default_level_is_info() {
        assert_eq!(ConsoleWriter::default().level(), Level::Info);
    }
}
