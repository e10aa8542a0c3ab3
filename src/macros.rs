//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. An optional
//! bracketed field list goes before the format string.
//!
//! # Examples
//!
//! ```
//! use unified_logger::prelude::*;
//! use unified_logger::info;
//!
//! let logger = Logger::nop();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With structured fields
//! info!(logger, [Field::num("port", port)], "Listening");
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use unified_logger::prelude::*;
/// # let logger = Logger::nop();
/// use unified_logger::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// log!(logger, Level::Warn, [Field::string("disk", "/var")], "{}% full", 91);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), &[$($field),*])
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), &[])
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use unified_logger::prelude::*;
/// # let logger = Logger::nop();
/// use unified_logger::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use unified_logger::prelude::*;
/// # let logger = Logger::nop();
/// use unified_logger::info;
/// info!(logger, "Application started");
/// info!(logger, [Field::num("items", 100)], "Processing");
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use unified_logger::prelude::*;
/// # let logger = Logger::nop();
/// use unified_logger::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use unified_logger::prelude::*;
/// # let logger = Logger::nop();
/// use unified_logger::error;
/// error!(logger, "Failed to connect to database");
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "refused");
/// error!(logger, [Field::error(err)], "Connect failed after {} tries", 3);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Field, Level, Logger, Output};
    use crate::writers::ObserverWriter;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn observed() -> (Logger, Arc<ObserverWriter>) {
        let observer = Arc::new(ObserverWriter::new(Level::Debug, Output::File));
        let logger = Logger::builder().shared_writer(observer.clone()).build();
        logger.initialize(Duration::ZERO);
        (logger, observer)
    }

    #[test]
    fn test_log_macro() {
        let (logger, observer) = observed();
        log!(logger, Level::Info, "Test message");
        log!(logger, Level::Warn, "Formatted: {}", 42);

        let entries = observer.snapshot();
        assert!(entries[0].equal_msg("Test message"));
        assert!(entries[1].equal_level(Level::Warn));
        assert!(entries[1].equal_msg("Formatted: 42"));
    }

    #[test]
    fn test_field_list() {
        let (logger, observer) = observed();
        info!(logger, [Field::num("a", 1), Field::bool("b", true),], "with {}", "fields");
        error!(logger, [], "no fields");

        let entries = observer.snapshot();
        assert!(entries[0].equal_msg("with fields"));
        assert_eq!(entries[0].get("a"), Some(&json!(1)));
        assert_eq!(entries[0].get("b"), Some(&json!(true)));
        assert!(entries[1].equal_level(Level::Error));
    }

    #[test]
    fn test_level_macros() {
        let (logger, observer) = observed();
        debug!(logger, "Debug message");
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);

        let levels: Vec<Level> = observer.snapshot().iter().map(|e| e.level()).collect();
        assert_eq!(levels, vec![Level::Debug, Level::Info, Level::Warn, Level::Error]);
    }

    #[test]
    fn test_macros_on_nop_logger() {
        let logger = Logger::nop();
        info!(logger, "Info message");
        warn!(logger, [Field::num("n", 1)], "Warning {}", 2);
    }
}
