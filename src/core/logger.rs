//! Main logger implementation
//!
//! A [`Logger`] is a cheap, immutable handle: a shared core (writers, the
//! encoding pipeline, phase, metrics and the current-logger slot) plus the
//! field lineage of this particular derivation. [`Logger::with`] and
//! [`Logger::group`] return new handles and never touch the receiver.

use super::{
    chain::FieldChain,
    encoder::{Backend, Encoder, EncoderOptions},
    field::Field,
    log_level::Level,
    metrics::LoggerMetrics,
    record::Record,
    timestamp::TimestampFormat,
    writer::{Sink, Writer},
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for [`Logger::initialize`] and [`Logger::flush`] (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of a logger family. Derived loggers share their root's phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built, writers not wired yet. Records are dropped.
    Uninitialized,
    /// Writers wired into the backend.
    Initialized,
    /// Writers released. Terminal; records are dropped.
    Flushed,
}

/// One writer wired into the backend
struct Route {
    name: String,
    level: Level,
    encoder: Encoder,
    sink: Sink,
}

struct LoggerCore {
    backend: Backend,
    options: EncoderOptions,
    writers: Vec<Arc<dyn Writer>>,
    routes: RwLock<Vec<Route>>,
    phase: RwLock<Phase>,
    /// Lineage of the most recently derived logger of this family
    current: Mutex<FieldChain>,
    metrics: LoggerMetrics,
}

impl LoggerCore {
    /// Write one record through every enabled route with per-route panic
    /// isolation, so one failing sink never blocks the others.
    fn dispatch(&self, record: &Record<'_>) {
        let routes = self.routes.read();
        let mut has_error = false;
        let mut delivered = false;

        for route in routes.iter().filter(|r| r.level.enabled(record.level)) {
            delivered = true;
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let line = route.encoder.encode(record);
                route.sink.write_record(line.as_bytes())
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Writer '{}' failed: {}", route.name, e);
                    has_error = true;
                }
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    eprintln!(
                        "[LOGGER CRITICAL] Writer '{}' panicked: {}. \
                         Other writers continue to function.",
                        route.name, panic_msg
                    );
                    has_error = true;
                }
            }
        }

        if has_error {
            self.metrics.record_dropped();
        } else if delivered {
            self.metrics.record_logged();
        }
    }
}

impl Drop for LoggerCore {
    fn drop(&mut self) {
        // Best effort: push out anything a sink still buffers. Writers are
        // not flushed here since they may outlive this logger.
        for route in self.routes.get_mut().iter() {
            let _ = route.sink.sync();
        }
    }
}

/// Immutable-context logging front end
///
/// # Example
///
/// ```
/// use unified_logger::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let observer = Arc::new(ObserverWriter::new(Level::Debug, Output::File));
/// let logger = Logger::builder().shared_writer(observer.clone()).build();
/// logger.initialize(Duration::from_secs(1));
///
/// let request = logger.with(&[Field::string("request_id", "r-1")]);
/// request.info("accepted", &[Field::num("items", 3)]);
///
/// let entry = &observer.snapshot()[0];
/// assert!(entry.equal_msg("accepted"));
/// assert_eq!(entry.get("request_id"), Some(&serde_json::json!("r-1")));
///
/// logger.flush(Duration::from_secs(1));
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Option<Arc<LoggerCore>>,
    chain: FieldChain,
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Build a root logger over the given writers
    #[must_use]
    pub fn new(backend: Backend, writers: Vec<Arc<dyn Writer>>) -> Self {
        writers
            .into_iter()
            .fold(Self::builder().backend(backend), LoggerBuilder::shared_writer)
            .build()
    }

    /// Logger that does nothing. `with`/`group` return the receiver.
    #[must_use]
    pub fn nop() -> Self {
        Self {
            core: None,
            chain: FieldChain::new(),
        }
    }

    pub fn is_nop(&self) -> bool {
        self.core.is_none()
    }

    /// Wire every writer into the backend, then wait on each of them.
    ///
    /// Only the first call on a logger family has an effect.
    pub fn initialize(&self, timeout: Duration) {
        let Some(core) = &self.core else {
            return;
        };

        {
            let mut phase = core.phase.write();
            if *phase != Phase::Uninitialized {
                return;
            }

            let routes = core
                .writers
                .iter()
                .map(|w| Route {
                    name: w.name().to_string(),
                    level: w.level(),
                    encoder: core.backend.encoder_for(w.output(), &core.options),
                    sink: w.sink(),
                })
                .collect();
            *core.routes.write() = routes;
            *phase = Phase::Initialized;
        }

        for writer in &core.writers {
            if !writer.wait(timeout) {
                eprintln!(
                    "[LOGGER WARNING] Writer '{}' was not ready within {:?}",
                    writer.name(),
                    timeout
                );
            }
        }
    }

    /// Flush every writer, then release the backend pipeline.
    ///
    /// Terminal for the whole family; later calls are no-ops.
    pub fn flush(&self, timeout: Duration) {
        let Some(core) = &self.core else {
            return;
        };

        {
            let mut phase = core.phase.write();
            if *phase == Phase::Flushed {
                return;
            }
            *phase = Phase::Flushed;
        }

        for writer in &core.writers {
            if let Err(e) = writer.flush(timeout) {
                eprintln!("[LOGGER ERROR] Writer '{}' flush failed: {}", writer.name(), e);
            }
        }

        for route in core.routes.write().drain(..) {
            let _ = route.sink.sync();
        }
    }

    /// Derive a logger carrying `fields` on top of this one's context.
    ///
    /// No fields returns the receiver unchanged. Every derivation becomes the
    /// family's [`current`](Logger::current) logger.
    #[must_use]
    pub fn with(&self, fields: &[Field]) -> Logger {
        if fields.is_empty() {
            return self.clone();
        }
        self.derive(|chain| chain.with_fields(fields))
    }

    /// Derive a logger nesting `fields` under `key`.
    ///
    /// The group is sealed: fields added later through [`with`](Logger::with)
    /// stay at the top level. An empty key or no fields returns the receiver.
    #[must_use]
    pub fn group(&self, key: &str, fields: &[Field]) -> Logger {
        if key.is_empty() || fields.is_empty() {
            return self.clone();
        }
        self.derive(|chain| chain.with_group(key, fields))
    }

    fn derive(&self, extend: impl FnOnce(&FieldChain) -> FieldChain) -> Logger {
        let Some(core) = &self.core else {
            return self.clone();
        };

        let mut current = core.current.lock();
        let chain = extend(&self.chain);
        *current = chain.clone();

        Logger {
            core: Some(Arc::clone(core)),
            chain,
        }
    }

    /// Most recently derived logger of this family (last writer wins)
    #[must_use]
    pub fn current(&self) -> Logger {
        match &self.core {
            Some(core) => Logger {
                core: Some(Arc::clone(core)),
                chain: core.current.lock().clone(),
            },
            None => self.clone(),
        }
    }

    pub fn log(&self, level: Level, message: impl AsRef<str>, fields: &[Field]) {
        let Some(core) = &self.core else {
            return;
        };
        if !level.is_valid() || *core.phase.read() != Phase::Initialized {
            return;
        }

        let record = Record::new(level, message.as_ref(), &self.chain, fields);
        core.dispatch(&record);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }

    /// Phase of this logger's family. A no-op logger is always initialized.
    pub fn phase(&self) -> Phase {
        match &self.core {
            Some(core) => *core.phase.read(),
            None => Phase::Initialized,
        }
    }

    pub fn backend(&self) -> Option<Backend> {
        self.core.as_ref().map(|core| core.backend)
    }

    /// Context accumulated by this logger
    pub fn context(&self) -> &FieldChain {
        &self.chain
    }

    /// Counters shared by the whole family, `None` for a no-op logger
    pub fn metrics(&self) -> Option<&LoggerMetrics> {
        self.core.as_ref().map(|core| &core.metrics)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::nop()
    }
}

impl PartialEq for Logger {
    /// Identity: same family and same lineage node
    fn eq(&self, other: &Self) -> bool {
        match (&self.core, &other.core) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) && self.chain.ptr_eq(&other.chain),
            _ => false,
        }
    }
}

impl Eq for Logger {}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.core {
            None => f.write_str("Logger::Nop"),
            Some(core) => f
                .debug_struct("Logger")
                .field("backend", &core.backend)
                .field("writers", &core.writers.len())
                .field("phase", &*core.phase.read())
                .field("context_items", &self.chain.len())
                .finish(),
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use unified_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .backend(Backend::Logfmt)
///     .writer(ConsoleWriter::new(Level::Info))
///     .build();
/// assert_eq!(logger.phase(), Phase::Uninitialized);
/// ```
pub struct LoggerBuilder {
    backend: Backend,
    writers: Vec<Arc<dyn Writer>>,
    options: EncoderOptions,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            backend: Backend::default(),
            writers: Vec::new(),
            options: EncoderOptions::default(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Add a writer owned by the logger
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Writer + 'static>(mut self, writer: W) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    /// Add a writer the caller keeps a handle to, e.g. an observer
    #[must_use = "builder methods return a new value"]
    pub fn shared_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writers.push(writer);
        self
    }

    /// Timestamp format for console text. An invalid custom pattern is
    /// reported and the previous format kept.
    #[must_use = "builder methods return a new value"]
    pub fn text_timestamp(mut self, format: TimestampFormat) -> Self {
        if let Some(format) = checked_timestamp(format) {
            self.options.text_timestamp = format;
        }
        self
    }

    /// Timestamp format for the JSON `time` key. An invalid custom pattern
    /// is reported and the previous format kept.
    #[must_use = "builder methods return a new value"]
    pub fn json_timestamp(mut self, format: TimestampFormat) -> Self {
        if let Some(format) = checked_timestamp(format) {
            self.options.json_timestamp = format;
        }
        self
    }

    /// Colorize console level labels (default: on)
    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, enabled: bool) -> Self {
        self.options.use_colors = enabled;
        self
    }

    /// Build the root Logger. It starts as its family's current logger.
    pub fn build(self) -> Logger {
        let core = LoggerCore {
            backend: self.backend,
            options: self.options,
            writers: self.writers,
            routes: RwLock::new(Vec::new()),
            phase: RwLock::new(Phase::Uninitialized),
            current: Mutex::new(FieldChain::new()),
            metrics: LoggerMetrics::new(),
        };
        Logger {
            core: Some(Arc::new(core)),
            chain: FieldChain::new(),
        }
    }
}

fn checked_timestamp(format: TimestampFormat) -> Option<TimestampFormat> {
    match format.validate() {
        Ok(()) => Some(format),
        Err(e) => {
            eprintln!("[LOGGER WARNING] {}; keeping previous timestamp format", e);
            None
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
