//! Core logger types and traits

pub mod chain;
pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output;
pub mod record;
pub mod request_context;
pub mod timestamp;
pub mod writer;

pub use chain::{ContextItem, FieldChain};
pub use config::{Config, ConfigOpt, FileConfig, TelemetryConfig};
pub use encoder::{Backend, Encoder, EncoderOptions};
pub use error::{LoggerError, Result};
pub use field::{Field, FieldKind, FieldValue, ERROR_KEY};
pub use log_level::Level;
pub use logger::{Logger, LoggerBuilder, Phase, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use output::Output;
pub use record::Record;
pub use request_context::{attach, retrieve, RequestContext};
pub use timestamp::TimestampFormat;
pub use writer::{Sink, SinkTarget, Writer};
