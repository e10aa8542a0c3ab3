//! Stress tests for concurrent derivation and writer access
//!
//! These tests verify:
//! - Concurrent `with` calls each keep exactly their own lineage
//! - The current-logger slot stays consistent under contention
//! - The observer writer tolerates concurrent writes, snapshots and drains
//! - The file writer keeps every record intact under concurrent logging

use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use unified_logger::prelude::*;
use unified_logger::writers::RotationPolicy;

const THREADS: usize = 16;
const PER_THREAD: usize = 200;

#[test]
fn test_concurrent_with_keeps_lineage() {
    let root = Logger::builder().build();
    let parent = root.with(&[Field::string("svc", "api")]);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let parent = parent.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                // Each thread gets its own observer over the same lineage.
                let observer = Arc::new(ObserverWriter::new(Level::Debug, Output::File));
                let logger = Logger::builder().shared_writer(observer.clone()).build();
                logger.initialize(Duration::ZERO);

                barrier.wait();
                let mine = logger
                    .with(&[Field::string("svc", "api")])
                    .with(&[Field::num("thread", t as i64)]);
                let derived = parent.with(&[Field::num("thread", t as i64)]);
                for i in 0..PER_THREAD {
                    mine.info("tick", &[Field::num("i", i as i64)]);
                }

                let entries = observer.drain_all();
                assert_eq!(entries.len(), PER_THREAD);
                for (i, entry) in entries.iter().enumerate() {
                    assert_eq!(entry.get("svc"), Some(&json!("api")));
                    assert_eq!(entry.get("thread"), Some(&json!(t)));
                    assert_eq!(entry.get("i"), Some(&json!(i)));
                }
                derived
            })
        })
        .collect();

    let derived: Vec<Logger> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    // Every derivation is distinct and the slot holds one of them.
    for (i, a) in derived.iter().enumerate() {
        for b in &derived[i + 1..] {
            assert_ne!(a, b);
        }
    }
    let current = root.current();
    assert!(derived.iter().any(|d| *d == current));
}

#[test]
fn test_concurrent_with_on_shared_logger() {
    let observer = Arc::new(ObserverWriter::new(Level::Debug, Output::File));
    let root = Logger::builder().shared_writer(observer.clone()).build();
    root.initialize(Duration::ZERO);
    let parent = root.group("req", &[Field::string("id", "r-1")]);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let parent = parent.clone();
            thread::spawn(move || {
                let child = parent.with(&[Field::num("worker", t as i64)]);
                for _ in 0..PER_THREAD {
                    child.debug("work", &[]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let entries = observer.drain_all();
    assert_eq!(entries.len(), THREADS * PER_THREAD);

    let mut per_worker = vec![0usize; THREADS];
    for entry in &entries {
        assert_eq!(entry.get("req"), Some(&json!({"id": "r-1"})));
        let worker = entry
            .get("worker")
            .and_then(|v| v.as_u64())
            .expect("worker field") as usize;
        per_worker[worker] += 1;
    }
    assert!(per_worker.iter().all(|&n| n == PER_THREAD));
    assert_eq!(
        root.metrics().map(|m| m.total_logged()),
        Some((THREADS * PER_THREAD) as u64)
    );
}

#[test]
fn test_observer_concurrent_drain() {
    let observer = Arc::new(ObserverWriter::new(Level::Debug, Output::File));
    let logger = Logger::builder().shared_writer(observer.clone()).build();
    logger.initialize(Duration::ZERO);

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.with(&[Field::num("t", t as i64)]);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("m{}", i), &[]);
                }
            })
        })
        .collect();

    let drainer = {
        let observer = Arc::clone(&observer);
        thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..50 {
                let _ = observer.snapshot();
                seen.extend(observer.drain_all());
                thread::yield_now();
            }
            seen
        })
    };

    for handle in writers {
        handle.join().expect("writer panicked");
    }
    let mut all = drainer.join().expect("drainer panicked");
    all.extend(observer.drain_all());

    assert_eq!(all.len(), THREADS * PER_THREAD);
    let unique: HashSet<String> = all
        .iter()
        .map(|e| format!("{}/{}", e.get("t").unwrap_or(&json!(null)), e.msg()))
        .collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
}

#[test]
fn test_file_writer_concurrent_records_intact() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("stress.log");
    let writer = FileWriter::with_policy(
        Level::Info,
        &log_file,
        RotationPolicy::new().with_max_size(64 * 1024).with_max_backups(50),
    );

    let logger = Logger::builder().writer(writer).build();
    logger.initialize(Duration::ZERO);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.with(&[Field::num("t", t as i64)]);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info("payload", &[Field::num("i", i as i64)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }
    logger.flush(DEFAULT_SHUTDOWN_TIMEOUT);

    let mut total = 0;
    for entry in fs::read_dir(temp_dir.path()).expect("read dir") {
        let content = fs::read_to_string(entry.expect("dir entry").path()).expect("read file");
        for line in content.lines() {
            let record: serde_json::Value =
                serde_json::from_str(line).expect("every line is a whole record");
            assert_eq!(record["msg"], "payload");
            total += 1;
        }
    }
    assert_eq!(total, THREADS * PER_THREAD);
}
