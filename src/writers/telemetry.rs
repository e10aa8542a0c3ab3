//! Remote telemetry writer
//!
//! Records are queued on a bounded channel and shipped in batches by a
//! background worker. The worker first performs the connection handshake and
//! signals anyone blocked in [`Writer::wait`]. Flushing closes the queue,
//! lets the worker drain it, and joins the worker within the timeout.

use crate::core::config::{TelemetryConfig, TELEMETRY_LICENSE_LEN};
use crate::core::error::{LoggerError, Result};
use crate::core::{Level, LoggerMetrics, Output, Sink, SinkTarget, Writer, DEFAULT_SHUTDOWN_TIMEOUT};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Records a queue can hold before new ones are dropped
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Upper bound the worker allows for the initial handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

const BATCH_SIZE: usize = 50;
const BATCH_TIMEOUT_MS: u64 = 10;

/// Connection to a log ingestion service
///
/// Implementations are driven from a single worker thread.
pub trait TelemetryTransport: Send + 'static {
    /// Establish the connection. Called once before any batch.
    fn connect(&mut self, timeout: Duration) -> Result<()>;

    /// Deliver one batch of trimmed log lines.
    fn send(&mut self, batch: &[String]) -> Result<()>;
}

/// Validate the settings a remote telemetry writer cannot start without.
pub fn validate(config: &TelemetryConfig) -> Result<()> {
    if config.app_name().trim().is_empty() {
        return Err(LoggerError::telemetry_init("app name is required"));
    }
    if config.license().len() != TELEMETRY_LICENSE_LEN {
        return Err(LoggerError::telemetry_init(format!(
            "license length is not {}",
            TELEMETRY_LICENSE_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Connecting,
    Connected,
    Failed,
}

struct Connection {
    state: Mutex<ConnState>,
    ready: Condvar,
}

impl Connection {
    fn set(&self, state: ConnState) {
        *self.state.lock() = state;
        self.ready.notify_all();
    }

    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state == ConnState::Connecting {
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        *state == ConnState::Connected
    }
}

/// Producer side of the worker queue, shared with every routed logger
struct TelemetryQueue {
    sender: Mutex<Option<Sender<String>>>,
    metrics: Arc<LoggerMetrics>,
}

impl SinkTarget for TelemetryQueue {
    fn write_record(&self, buf: &[u8]) -> Result<()> {
        let line = String::from_utf8_lossy(buf).trim().to_string();
        if line.is_empty() {
            return Ok(());
        }

        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(LoggerError::writer_closed("telemetry"));
        };

        match sender.try_send(line) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.metrics.record_dropped();
                if self.metrics.record_queue_full() == 0 {
                    eprintln!("[LOGGER WARNING] Telemetry queue is full, dropping records");
                }
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::writer_closed("telemetry")),
        }
    }
}

/// Writer shipping records to a remote ingestion service
///
/// # Example
///
/// ```no_run
/// use unified_logger::prelude::*;
///
/// let cfg = Config::default()
///     .with_app_name("billing")
///     .with_license("0123456789012345678901234567890123456789");
/// let writer = TelemetryWriter::new(Level::Info, &cfg)?;
/// assert!(writer.wait(std::time::Duration::from_secs(5)));
/// # Ok::<(), unified_logger::LoggerError>(())
/// ```
pub struct TelemetryWriter {
    level: Level,
    app_name: String,
    queue: Arc<TelemetryQueue>,
    connection: Arc<Connection>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl TelemetryWriter {
    /// Writer posting to the configured endpoint over HTTP
    ///
    /// # Errors
    ///
    /// [`LoggerError::TelemetryInit`] if the app name is empty, the license
    /// is not exactly 40 characters, or the endpoint is unusable.
    #[cfg(feature = "telemetry")]
    pub fn new(level: Level, config: &crate::core::Config) -> Result<Self> {
        validate(config.telemetry())?;
        let transport = HttpTransport::new(config.telemetry())?;
        Self::with_transport(level, config.telemetry(), transport)
    }

    /// Writer over a caller-supplied transport
    pub fn with_transport<T: TelemetryTransport>(
        level: Level,
        config: &TelemetryConfig,
        transport: T,
    ) -> Result<Self> {
        Self::spawn(level, config, transport, DEFAULT_QUEUE_CAPACITY)
    }

    /// Like [`with_transport`](Self::with_transport) with an explicit queue size
    pub fn spawn<T: TelemetryTransport>(
        level: Level,
        config: &TelemetryConfig,
        transport: T,
        queue_capacity: usize,
    ) -> Result<Self> {
        validate(config)?;

        let (sender, receiver) = bounded(queue_capacity.max(1));
        let metrics = Arc::new(LoggerMetrics::new());
        let connection = Arc::new(Connection {
            state: Mutex::new(ConnState::Connecting),
            ready: Condvar::new(),
        });

        let worker_connection = Arc::clone(&connection);
        let worker_metrics = Arc::clone(&metrics);
        let handle = thread::Builder::new()
            .name("telemetry-writer".to_string())
            .spawn(move || run_worker(transport, receiver, &worker_connection, &worker_metrics))
            .map_err(|e| LoggerError::io_operation("spawn telemetry worker", "thread spawn failed", e))?;

        Ok(Self {
            level,
            app_name: config.app_name().to_string(),
            queue: Arc::new(TelemetryQueue {
                sender: Mutex::new(Some(sender)),
                metrics,
            }),
            connection,
            worker: Mutex::new(Some(handle)),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Delivery counters: shipped, dropped, and queue-full events
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.queue.metrics
    }

    /// Close the queue and wait for the worker to drain it.
    ///
    /// Returns `false` if the worker was still running at the deadline.
    fn shutdown(&self, timeout: Duration) -> bool {
        drop(self.queue.sender.lock().take());

        let Some(handle) = self.worker.lock().take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[LOGGER ERROR] Telemetry worker panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Telemetry worker did not finish within timeout. \
                     Some logs may be lost."
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

fn run_worker<T: TelemetryTransport>(
    mut transport: T,
    receiver: Receiver<String>,
    connection: &Connection,
    metrics: &LoggerMetrics,
) {
    match transport.connect(HANDSHAKE_TIMEOUT) {
        Ok(()) => connection.set(ConnState::Connected),
        Err(e) => {
            eprintln!("[LOGGER WARNING] Telemetry handshake failed: {}", e);
            connection.set(ConnState::Failed);
        }
    }

    let mut batch = Vec::with_capacity(BATCH_SIZE);
    loop {
        match receiver.recv() {
            Ok(line) => batch.push(line),
            Err(_) => break,
        }

        while batch.len() < BATCH_SIZE {
            match receiver.try_recv() {
                Ok(line) => batch.push(line),
                Err(_) => break,
            }
        }

        if batch.len() < BATCH_SIZE {
            // Small batch - wait a bit for more entries
            thread::sleep(Duration::from_millis(BATCH_TIMEOUT_MS));
            while batch.len() < BATCH_SIZE {
                match receiver.try_recv() {
                    Ok(line) => batch.push(line),
                    Err(_) => break,
                }
            }
        }

        ship(&mut transport, &batch, metrics);
        batch.clear();
    }
}

fn ship<T: TelemetryTransport>(transport: &mut T, batch: &[String], metrics: &LoggerMetrics) {
    match transport.send(batch) {
        Ok(()) => {
            for _ in batch {
                metrics.record_logged();
            }
        }
        Err(e) => {
            eprintln!(
                "[LOGGER ERROR] Telemetry delivery of {} records failed: {}",
                batch.len(),
                e
            );
            for _ in batch {
                metrics.record_dropped();
            }
        }
    }
}

impl Writer for TelemetryWriter {
    fn sink(&self) -> Sink {
        Sink::new(self.queue.clone())
    }

    fn output(&self) -> Output {
        Output::RemoteTelemetry
    }

    fn level(&self) -> Level {
        self.level
    }

    /// Block until the handshake finished or `timeout` elapsed.
    fn wait(&self, timeout: Duration) -> bool {
        self.connection.wait(timeout)
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        if self.shutdown(timeout) {
            Ok(())
        } else {
            Err(LoggerError::writer(format!(
                "telemetry worker did not stop within {:?}",
                timeout
            )))
        }
    }

    fn name(&self) -> &str {
        "telemetry"
    }
}

impl Drop for TelemetryWriter {
    fn drop(&mut self) {
        if self.worker.get_mut().is_some() {
            let _ = self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}

#[cfg(feature = "telemetry")]
pub use http::HttpTransport;

#[cfg(feature = "telemetry")]
mod http {
    use super::TelemetryTransport;
    use crate::core::config::TelemetryConfig;
    use crate::core::error::{LoggerError, Result};
    use reqwest::blocking::Client;
    use reqwest::Url;
    use std::net::{TcpStream, ToSocketAddrs};
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// New Relic Log API over HTTPS
    pub struct HttpTransport {
        client: Client,
        endpoint: Url,
        license: String,
        app_name: String,
    }

    impl HttpTransport {
        pub fn new(config: &TelemetryConfig) -> Result<Self> {
            let endpoint = Url::parse(config.endpoint()).map_err(|e| {
                LoggerError::telemetry_init(format!("invalid endpoint '{}': {}", config.endpoint(), e))
            })?;
            if endpoint.host_str().is_none() {
                return Err(LoggerError::telemetry_init(format!(
                    "endpoint '{}' has no host",
                    endpoint
                )));
            }

            let client = Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|e| LoggerError::telemetry_init(e.to_string()))?;

            Ok(Self {
                client,
                endpoint,
                license: config.license().to_string(),
                app_name: config.app_name().to_string(),
            })
        }

        fn payload(&self, batch: &[String]) -> serde_json::Value {
            let logs: Vec<_> = batch
                .iter()
                .map(|line| serde_json::json!({ "message": line }))
                .collect();
            serde_json::json!([{
                "common": { "attributes": { "entity.name": self.app_name } },
                "logs": logs,
            }])
        }
    }

    impl TelemetryTransport for HttpTransport {
        /// TCP handshake with the ingestion host
        fn connect(&mut self, timeout: Duration) -> Result<()> {
            let host = self.endpoint.host_str().unwrap_or_default();
            let port = self.endpoint.port_or_known_default().unwrap_or(443);

            let addrs = (host, port).to_socket_addrs().map_err(|e| {
                LoggerError::io_operation("resolve telemetry endpoint", host.to_string(), e)
            })?;

            let mut last_err = None;
            for addr in addrs {
                match TcpStream::connect_timeout(&addr, timeout) {
                    Ok(_) => return Ok(()),
                    Err(e) => last_err = Some(e),
                }
            }
            Err(match last_err {
                Some(e) => LoggerError::io_operation("connect telemetry endpoint", host.to_string(), e),
                None => LoggerError::writer(format!("no address for {}", host)),
            })
        }

        fn send(&mut self, batch: &[String]) -> Result<()> {
            self.client
                .post(self.endpoint.clone())
                .header("Api-Key", &self.license)
                .json(&self.payload(batch))
                .send()
                .and_then(|resp| resp.error_for_status())
                .map_err(|e| LoggerError::writer(format!("telemetry request failed: {}", e)))?;
            Ok(())
        }
    }

}
