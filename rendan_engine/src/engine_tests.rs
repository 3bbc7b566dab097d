//! Unit tests for the Engine logging hub and the logging macros
//!
//! The logger is a global OnceLock shared across all tests in this crate, so every
//! test that installs a logger is marked #[serial]. Other unit tests may log
//! concurrently; the capture logger only keeps entries from "rendan::test" sources.

use crate::rendan::{Engine, Error};
use crate::rendan::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source.starts_with("rendan::test") {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

// ============================================================================
// LOGGING API TESTS
// ============================================================================

#[test]
#[serial]
fn test_default_logger_logs_without_panic() {
    Engine::reset_logger();

    Engine::log(LogSeverity::Info, "test", "Test message".to_string());
    Engine::log(LogSeverity::Warn, "test", "Warning message".to_string());
    Engine::log_detailed(LogSeverity::Error, "test", "Error message".to_string(), "test.rs", 1);
}

#[test]
#[serial]
fn test_set_custom_logger() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    Engine::log(LogSeverity::Info, "rendan::test", "Message 1".to_string());
    Engine::log(LogSeverity::Warn, "rendan::test", "Message 2".to_string());

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, LogSeverity::Info);
        assert_eq!(entries[0].message, "Message 1");
        assert_eq!(entries[1].severity, LogSeverity::Warn);
        assert!(entries[1].file.is_none());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_to_default() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);
    Engine::reset_logger();

    Engine::log(LogSeverity::Info, "rendan::test", "After reset".to_string());

    assert!(entries.lock().unwrap().is_empty());
}

#[test]
#[serial]
fn test_log_detailed_with_file_line() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    Engine::log_detailed(
        LogSeverity::Error,
        "rendan::test",
        "Detailed error".to_string(),
        "test.rs",
        42,
    );

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "rendan::test");
        assert_eq!(entries[0].file, Some("test.rs"));
        assert_eq!(entries[0].line, Some(42));
    }

    Engine::reset_logger();
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_level_macros_route_severity() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    crate::engine_trace!("rendan::test", "trace {}", 1);
    crate::engine_debug!("rendan::test", "debug {}", 2);
    crate::engine_info!("rendan::test", "info {}", 3);
    crate::engine_warn!("rendan::test", "warn {}", 4);
    crate::engine_error!("rendan::test", "error {}", 5);

    {
        let entries = entries.lock().unwrap();
        let severities: Vec<LogSeverity> = entries.iter().map(|e| e.severity).collect();
        assert_eq!(
            severities,
            vec![
                LogSeverity::Trace,
                LogSeverity::Debug,
                LogSeverity::Info,
                LogSeverity::Warn,
                LogSeverity::Error,
            ]
        );
        assert_eq!(entries[2].message, "info 3");
        // Only the error macro carries a location
        assert!(entries[3].line.is_none());
        assert!(entries[4].file.is_some());
        assert!(entries[4].line.is_some());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_err_logs_and_builds_variant() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let err = crate::engine_err!(ShaderError, "rendan::test::shader", "bad magic 0x{:08x}", 0xdeadbeefu32);

    match err {
        Error::ShaderError(msg) => assert_eq!(msg, "bad magic 0xdeadbeef"),
        other => panic!("unexpected variant: {:?}", other),
    }
    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, LogSeverity::Error);
        assert_eq!(entries[0].source, "rendan::test::shader");
        assert!(entries[0].line.is_some());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    #[allow(unreachable_code)]
    fn fails(reached: &mut bool) -> crate::rendan::Result<()> {
        crate::engine_bail!(InitError, "rendan::test", "no suitable GPU");
        *reached = true;
        Ok(())
    }

    let mut reached = false;
    let result = fails(&mut reached);

    assert!(matches!(result, Err(Error::InitError(ref m)) if m == "no suitable GPU"));
    assert!(!reached);
    assert_eq!(entries.lock().unwrap().len(), 1);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_warn_logs_at_warn_level() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    fn stale() -> crate::rendan::Result<u32> {
        crate::engine_bail_warn!(TransientPresentError, "rendan::test", "swapchain out of date");
    }

    let result = stale();

    assert!(matches!(result, Err(ref e) if e.is_transient()));
    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, LogSeverity::Warn);
        assert!(entries[0].file.is_none());
    }

    Engine::reset_logger();
}
