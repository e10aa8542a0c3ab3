//! Writer implementations

pub mod console;
pub mod file;
pub mod observer;
pub mod telemetry;

pub use console::ConsoleWriter;
pub use file::{FileWriter, RotatingFile, RotationPolicy};
pub use observer::{ObservedEntry, ObserverWriter};
#[cfg(feature = "telemetry")]
pub use telemetry::HttpTransport;
pub use telemetry::{TelemetryTransport, TelemetryWriter};

pub use crate::core::Writer;
