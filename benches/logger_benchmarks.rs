//! Criterion benchmarks for unified_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use unified_logger::core::{FieldChain, Record};
use unified_logger::prelude::*;

/// Writer that encodes and discards everything
struct DiscardWriter {
    output: Output,
    level: Level,
}

impl Writer for DiscardWriter {
    fn sink(&self) -> Sink {
        Sink::from_writer(io::sink())
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
        "discard"
    }
}

fn logger(backend: Backend, output: Output, level: Level) -> Logger {
    let logger = Logger::builder()
        .backend(backend)
        .colors(false)
        .writer(DiscardWriter { output, level })
        .build();
    logger.initialize(Duration::ZERO);
    logger
}

// ============================================================================
// Derivation Benchmarks
// ============================================================================

fn bench_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivation");
    group.throughput(Throughput::Elements(1));

    let root = logger(Backend::Structured, Output::File, Level::Debug);
    let deep = (0..32).fold(root.clone(), |l, i| l.with(&[Field::num("depth", i)]));

    group.bench_function("with_one_field", |b| {
        b.iter(|| black_box(root.with(&[Field::string("request_id", "r-1")])));
    });

    group.bench_function("with_on_deep_lineage", |b| {
        b.iter(|| black_box(deep.with(&[Field::num("n", 1)])));
    });

    group.bench_function("group", |b| {
        b.iter(|| black_box(root.group("http", &[Field::string("method", "GET")])));
    });

    group.bench_function("with_empty", |b| {
        b.iter(|| black_box(root.with(&[])));
    });

    group.finish();
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    let cases = [
        ("structured_json", Backend::Structured, Output::File),
        ("structured_console", Backend::Structured, Output::Console),
        ("logfmt_console", Backend::Logfmt, Output::Console),
    ];

    for (name, backend, output) in cases {
        let logger = logger(backend, output, Level::Debug)
            .with(&[Field::string("svc", "api")])
            .group("req", &[Field::num("id", 7)]);

        group.bench_function(name, |b| {
            b.iter(|| {
                logger.info(
                    black_box("Request processed"),
                    &[Field::num("status", 200), Field::float("ms", 12.5)],
                );
            });
        });
    }

    group.finish();
}

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    let logger = logger(Backend::Structured, Output::File, Level::Error);

    group.bench_function("filtered_out", |b| {
        b.iter(|| logger.debug(black_box("dropped"), &[]));
    });

    group.bench_function("nop_logger", |b| {
        let nop = Logger::nop();
        b.iter(|| nop.error(black_box("ignored"), &[Field::num("n", 1)]));
    });

    group.finish();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    for num_threads in [2, 4, 8] {
        group.throughput(Throughput::Elements(num_threads as u64 * 100));
        group.bench_function(format!("{}_threads", num_threads), |b| {
            let logger = Arc::new(logger(Backend::Structured, Output::File, Level::Debug));
            b.iter(|| {
                let handles: Vec<_> = (0..num_threads)
                    .map(|t| {
                        let logger = logger.with(&[Field::num("thread", t)]);
                        thread::spawn(move || {
                            for i in 0..100 {
                                logger.info("concurrent", &[Field::num("i", i)]);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.join();
                }
            });
        });
    }

    group.finish();
}

// ============================================================================
// Encoder Benchmarks
// ============================================================================

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");
    let options = unified_logger::core::EncoderOptions {
        use_colors: false,
        ..Default::default()
    };
    let chain = FieldChain::new()
        .with_fields(&[Field::string("svc", "api")])
        .with_group("req", &[Field::num("id", 7), Field::bool("cached", false)]);
    let fields = [Field::any("tags", &["a", "b", "c"])];

    for (name, backend, output) in [
        ("json", Backend::Structured, Output::File),
        ("pretty", Backend::Structured, Output::Console),
        ("logfmt", Backend::Logfmt, Output::Console),
    ] {
        let encoder = backend.encoder_for(output, &options);
        group.bench_function(name, |b| {
            b.iter(|| {
                let record = Record::new(Level::Info, "encode me", &chain, &fields);
                black_box(encoder.encode(&record))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_derivation,
    bench_logging,
    bench_level_filtering,
    bench_concurrent_logging,
    bench_encoding,
);
criterion_main!(benches);
