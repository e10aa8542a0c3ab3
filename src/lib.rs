//! # Unified Logger
//!
//! A structured logging facade: one [`Logger`] API in front of a choice of
//! encoding backends and any number of output writers.
//!
//! ## Features
//!
//! - **Typed fields**: string, integer, float, bool, arbitrary serializable
//!   values and errors, each rendered natively by every encoder
//! - **Immutable context**: [`Logger::with`] and [`Logger::group`] derive new
//!   loggers that share lineage by reference and never affect their parent
//! - **Multiple writers**: console, size-rotated file, remote telemetry, and an
//!   in-memory observer for tests, each with its own minimum level
//! - **Request context**: carry a logger through a call chain with
//!   [`attach`] and [`retrieve`]
//!
//! ## Example
//!
//! ```
//! use unified_logger::prelude::*;
//! use std::time::Duration;
//!
//! let logger = Logger::builder()
//!     .backend(Backend::Logfmt)
//!     .writer(ConsoleWriter::new(Level::Info))
//!     .build();
//! logger.initialize(Duration::from_secs(1));
//!
//! let request = logger.with(&[Field::string("request_id", "r-42")]);
//! request.info("request accepted", &[Field::num("items", 3)]);
//! unified_logger::warn!(request, "slow upstream: {}ms", 870);
//!
//! logger.flush(DEFAULT_SHUTDOWN_TIMEOUT);
//! ```

pub mod core;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::core::{
        attach, retrieve, Backend, Config, ConfigOpt, Field, FieldKind, FieldValue, Level,
        Logger, LoggerBuilder, LoggerError, LoggerMetrics, Output, Phase, RequestContext,
        Result, Sink, TimestampFormat, Writer, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::writers::{
        ConsoleWriter, FileWriter, ObservedEntry, ObserverWriter, RotationPolicy,
        TelemetryTransport, TelemetryWriter,
    };
}

pub use crate::core::{
    attach, retrieve, Backend, Config, ConfigOpt, Field, FieldKind, FieldValue, Level, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, Output, Phase, RequestContext, Result, Sink,
    SinkTarget, TimestampFormat, Writer, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use writers::{ConsoleWriter, FileWriter, ObserverWriter, TelemetryWriter};
