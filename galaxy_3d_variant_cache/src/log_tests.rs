//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger and the
//! process-wide logger swap used by the engine_* macros.

use crate::log::{self, Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use serial_test::serial;

// ============================================================================
// Helpers
// ============================================================================

/// Captures entries whose source starts with `prefix` (other tests log concurrently)
struct CaptureLogger {
    prefix: &'static str,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    fn new(prefix: &'static str) -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { prefix, entries: entries.clone() }, entries)
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source.starts_with(self.prefix) {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "test".to_string(),
        message: format!("{:?} message", severity),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Warn), "Warn");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        // Both branches: with and without file:line
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("program_cache.rs"), Some(42)));
    }
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// GLOBAL LOGGER TESTS
// ============================================================================

#[test]
#[serial]
fn test_set_logger_receives_macro_output() {
    let (logger, entries) = CaptureLogger::new("test::log::macros");
    log::set_logger(logger);

    crate::engine_debug!("test::log::macros", "debug {}", 1);
    crate::engine_warn!("test::log::macros", "warn {}", 2);
    crate::engine_error!("test::log::macros", "error {}", 3);

    log::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].severity, LogSeverity::Debug);
    assert_eq!(entries[0].message, "debug 1");
    assert!(entries[0].file.is_none());
    assert_eq!(entries[1].severity, LogSeverity::Warn);
    assert_eq!(entries[2].severity, LogSeverity::Error);
    assert_eq!(entries[2].message, "error 3");
    assert!(entries[2].file.is_some());
    assert!(entries[2].line.is_some());
}

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    let (logger, entries) = CaptureLogger::new("test::log::reset");
    log::set_logger(logger);
    log::reset_logger();

    crate::engine_info!("test::log::reset", "not captured");

    assert!(entries.lock().unwrap().is_empty());
}

#[test]
#[serial]
fn test_engine_bail_logs_and_returns_invalid_resource() {
    fn failing(count: u32) -> Result<u32> {
        if count == 0 {
            crate::engine_bail!("test::log::bail", "count must be non-zero (got {})", count);
        }
        Ok(count)
    }

    let (logger, entries) = CaptureLogger::new("test::log::bail");
    log::set_logger(logger);

    let result = failing(0);
    assert_eq!(failing(3), Ok(3));

    log::reset_logger();

    assert_eq!(result, Err(Error::InvalidResource("count must be non-zero (got 0)".to_string())));
    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
}
