//! Basic logger usage example
//!
//! Demonstrates both backends on the console, a rotating file writer, derived
//! loggers, groups and request-context propagation.
//!
//! Run with: cargo run --example basic_usage

use std::time::Duration;
use unified_logger::prelude::*;
use unified_logger::{info, warn};

fn handle_request(ctx: &RequestContext, items: i64) {
    let logger = retrieve(ctx);
    info!(logger, [Field::num("items", items)], "handling request");
    if items > 10 {
        warn!(logger, "large request: {} items", items);
    }
}

fn main() -> Result<()> {
    println!("=== Unified Logger - Basic Usage Example ===\n");

    let log_dir = std::env::temp_dir().join("unified_logger_demo");
    let cfg = Config::new([
        ConfigOpt::FilePath(log_dir.join("app.log")),
        ConfigOpt::FileSize(10),
        ConfigOpt::FileMaxBackups(3),
    ]);

    // Structured backend: colored text on the console, JSON in the file
    println!("1. Structured backend:");
    let logger = Logger::builder()
        .backend(Backend::Structured)
        .writer(ConsoleWriter::new(Level::Debug))
        .writer(FileWriter::new(Level::Info, &cfg))
        .build();
    logger.initialize(Duration::from_secs(1));

    logger.debug("This is a debug message", &[]);
    logger.info("This is an info message", &[Field::bool("ready", true)]);
    logger.warn("This is a warning message", &[Field::float("load", 0.93)]);
    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out");
    logger.error("This is an error message", &[Field::error(err)]);

    println!("\n2. Derived loggers and groups:");
    let svc = logger.with(&[Field::string("service", "billing")]);
    let http = svc.group("http", &[Field::string("method", "POST"), Field::num("status", 201)]);
    http.info("invoice created", &[Field::any("ids", &[17, 18])]);
    svc.info("parent is unchanged", &[]);

    println!("\n3. Request context:");
    let request = svc.with(&[Field::string("request_id", "r-42")]);
    let ctx = attach(&RequestContext::background(), Some(&request));
    handle_request(&ctx, 25);
    handle_request(&RequestContext::background(), 1); // no logger attached: silent

    logger.flush(DEFAULT_SHUTDOWN_TIMEOUT);
    println!("\n   JSON records written to {}", cfg.file().path().display());

    // Logfmt backend on the console
    println!("\n4. Logfmt backend:");
    let logfmt = Logger::builder()
        .backend(Backend::Logfmt)
        .writer(ConsoleWriter::new(Level::Info))
        .build();
    logfmt.initialize(Duration::from_secs(1));
    logfmt
        .group("db", &[Field::string("table", "users")])
        .info("Query executed", &[Field::num("rows", 3)]);
    logfmt.debug("Debug message (hidden)", &[]);
    logfmt.flush(DEFAULT_SHUTDOWN_TIMEOUT);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
