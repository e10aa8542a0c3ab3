//! Writer trait for log output destinations

use super::{error::Result, log_level::Level, output::Output};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

/// Anything that can absorb one encoded record at a time.
///
/// Implementations use interior mutability so a single target can be shared
/// between its writer and every logger routed to it.
pub trait SinkTarget: Send + Sync {
    /// Write one complete, newline-terminated record.
    fn write_record(&self, buf: &[u8]) -> Result<()>;

    /// Push buffered bytes to the underlying destination.
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write + Send> SinkTarget for Mutex<W> {
    fn write_record(&self, buf: &[u8]) -> Result<()> {
        self.lock().write_all(buf)?;
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.lock().flush()?;
        Ok(())
    }
}

/// Cheaply clonable handle to a writer's byte sink
#[derive(Clone)]
pub struct Sink {
    target: Arc<dyn SinkTarget>,
}

impl Sink {
    pub fn new(target: Arc<dyn SinkTarget>) -> Self {
        Self { target }
    }

    /// Wrap a plain `io::Write` behind a mutex.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::new(Arc::new(Mutex::new(writer)))
    }

    pub fn write_record(&self, buf: &[u8]) -> Result<()> {
        self.target.write_record(buf)
    }

    pub fn sync(&self) -> Result<()> {
        self.target.sync()
    }

    /// Whether both handles point at the same target
    #[must_use]
    pub fn same_target(&self, other: &Sink) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.target
            .write_record(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.target
            .sync()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

/// One physical log destination plus its minimum severity
///
/// Lifecycle: constructed once, optionally [`wait`](Writer::wait)ed on before
/// the first record, [`flush`](Writer::flush)ed once at shutdown.
pub trait Writer: Send + Sync {
    /// Byte sink records are written to
    fn sink(&self) -> Sink;

    /// Kind of destination, used to choose an encoding
    fn output(&self) -> Output;

    /// Minimum accepted severity
    fn level(&self) -> Level;

    /// Block until the writer is ready or `timeout` elapses.
    ///
    /// Returns whether the writer became ready. Never fails.
    fn wait(&self, _timeout: Duration) -> bool {
        true
    }

    /// Release the sink at shutdown.
    fn flush(&self, timeout: Duration) -> Result<()>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_from_writer_shares_target() {
        let sink = Sink::from_writer(Vec::<u8>::new());
        let clone = sink.clone();
        assert!(sink.same_target(&clone));

        sink.write_record(b"one\n").unwrap();
        clone.write_record(b"two\n").unwrap();
        sink.sync().unwrap();
    }

    #[test]
    fn test_sink_as_io_write() {
        let target = Arc::new(Mutex::new(Vec::<u8>::new()));
        let mut sink = Sink::new(target.clone());
        writeln!(sink, "hello").unwrap();
        sink.flush().unwrap();
        assert_eq!(target.lock().as_slice(), b"hello\n");
    }
}
