//! In-memory writer for asserting on emitted records
//!
//! Every record is parsed as JSON: `level` and `msg` are lifted out, and the
//! whole object is kept as context. Malformed input still produces an entry,
//! with an [`Level::Invalid`] level and empty message.

use crate::core::{Level, Output, Result, Sink, SinkTarget, Writer};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// One record as seen by an [`ObserverWriter`]
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedEntry {
    level: Level,
    msg: String,
    context: Map<String, Value>,
}

impl ObservedEntry {
    fn parse(buf: &[u8]) -> Self {
        let context = match serde_json::from_slice::<Value>(buf) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let level = context
            .get("level")
            .and_then(Value::as_str)
            .map_or(Level::Invalid, Level::parse);
        let msg = context
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            level,
            msg,
            context,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn equal_level(&self, level: Level) -> bool {
        self.level == level
    }

    pub fn equal_msg(&self, msg: &str) -> bool {
        self.msg == msg
    }

    pub fn contain_msg(&self, needle: &str) -> bool {
        self.msg.contains(needle)
    }

    /// Value stored under `key`, including `time`, `level` and `msg`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }
}

#[derive(Default)]
struct ObservedLog {
    entries: RwLock<Vec<ObservedEntry>>,
}

impl SinkTarget for ObservedLog {
    fn write_record(&self, buf: &[u8]) -> Result<()> {
        // Parse outside the lock.
        let entry = ObservedEntry::parse(buf);
        self.entries.write().push(entry);
        Ok(())
    }
}

/// Writer that keeps every record in memory
///
/// Cheap to clone; clones share the same store, so keep one handle for
/// assertions and give another (or an `Arc`) to the logger.
///
/// # Example
///
/// ```
/// use unified_logger::prelude::*;
///
/// let observer = ObserverWriter::new(Level::Debug, Output::File);
/// observer
///     .sink()
///     .write_record(br#"{"level":"warn","msg":"hello","x":5}"#)
///     .unwrap();
///
/// let entries = observer.snapshot();
/// assert!(entries[0].equal_level(Level::Warn));
/// assert!(entries[0].equal_msg("hello"));
/// assert_eq!(entries[0].get("x"), Some(&serde_json::json!(5)));
/// ```
#[derive(Clone)]
pub struct ObserverWriter {
    level: Level,
    output: Output,
    log: Arc<ObservedLog>,
}

impl ObserverWriter {
    /// `output` decides which encoding the logger sends; use a structured
    /// output to get parsed entries.
    pub fn new(level: Level, output: Output) -> Self {
        Self {
            level,
            output,
            log: Arc::new(ObservedLog::default()),
        }
    }

    pub fn count(&self) -> usize {
        self.log.entries.read().len()
    }

    /// Copy of every entry, oldest first. Leaves the store intact.
    pub fn snapshot(&self) -> Vec<ObservedEntry> {
        self.log.entries.read().clone()
    }

    /// Take every entry, leaving the store empty.
    pub fn drain_all(&self) -> Vec<ObservedEntry> {
        std::mem::take(&mut *self.log.entries.write())
    }
}

impl Writer for ObserverWriter {
    fn sink(&self) -> Sink {
        Sink::new(self.log.clone())
    }

    fn output(&self) -> Output {
        self.output
    }

    fn level(&self) -> Level {
        self.level
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "observer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    fn write(observer: &ObserverWriter, line: &str) {
        observer.sink().write_record(line.as_bytes()).unwrap();
    }

    #[test]
    fn test_parses_level_msg_and_context() {
        let observer = ObserverWriter::new(Level::Debug, Output::File);
        write(&observer, "{\"level\":\"warn\",\"msg\":\"hello\",\"x\":5}\n");

        assert_eq!(observer.count(), 1);
        let entry = &observer.snapshot()[0];
        assert!(entry.equal_level(Level::Warn));
        assert!(entry.equal_msg("hello"));
        assert!(entry.contain_msg("ell"));
        assert_eq!(entry.get("x"), Some(&json!(5)));
        assert_eq!(entry.get("msg"), Some(&json!("hello")));
        assert_eq!(entry.get("missing"), None);
    }

    #[test]
    fn test_malformed_input_still_recorded() {
        let observer = ObserverWriter::new(Level::Debug, Output::File);
        write(&observer, "not json at all");
        write(&observer, "[1, 2, 3]");
        write(&observer, "{\"level\":\"loud\",\"msg\":7}");

        let entries = observer.snapshot();
        assert_eq!(entries.len(), 3);
        for entry in &entries {
            assert_eq!(entry.level(), Level::Invalid);
            assert_eq!(entry.msg(), "");
        }
        assert!(entries[0].context().is_empty());
        assert_eq!(entries[2].get("msg"), Some(&json!(7)));
    }

    #[test]
    fn test_snapshot_is_non_destructive_and_drain_clears() {
        let observer = ObserverWriter::new(Level::Info, Output::File);
        write(&observer, "{\"level\":\"info\",\"msg\":\"a\"}");
        write(&observer, "{\"level\":\"error\",\"msg\":\"b\"}");

        assert_eq!(observer.snapshot().len(), 2);
        assert_eq!(observer.count(), 2);

        let drained = observer.drain_all();
        assert_eq!(drained.len(), 2);
        assert!(drained[1].equal_msg("b"));
        assert_eq!(observer.count(), 0);
        assert!(observer.drain_all().is_empty());
    }

    #[test]
    fn test_clones_share_store() {
        let observer = ObserverWriter::new(Level::Info, Output::Console);
        let clone = observer.clone();
        write(&clone, "{\"msg\":\"shared\"}");
        assert_eq!(observer.count(), 1);
        assert_eq!(observer.output(), Output::Console);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let observer = ObserverWriter::new(Level::Debug, Output::File);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let observer = observer.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        write(&observer, &format!("{{\"msg\":\"t{}-{}\"}}", t, i));
                        let _ = observer.count();
                        let _ = observer.snapshot();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(observer.drain_all().len(), 800);
    }
}
