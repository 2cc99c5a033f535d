use super::*;
use crate::error::Error;
use serial_test::serial;
use std::sync::{Arc, Mutex};

/// Captures entries from one source only; other tests log concurrently
struct CaptureLogger {
    source: &'static str,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == self.source {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

fn capture(source: &'static str) -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Runtime::set_logger(CaptureLogger { source, entries: Arc::clone(&entries) });
    entries
}

fn failing_lookup(name: &str) -> crate::error::Result<u32> {
    crate::glc_bail!("glcache::runtime_tests::bail", NotFound, "no entry named '{}'", name);
}

#[test]
#[serial]
fn test_macros_route_through_runtime() {
    let entries = capture("glcache::runtime_tests::macros");

    crate::glc_debug!("glcache::runtime_tests::macros", "value {}", 1);
    crate::glc_warn!("glcache::runtime_tests::macros", "value {}", 2);
    crate::glc_error!("glcache::runtime_tests::macros", "value {}", 3);

    let captured = entries.lock().unwrap().clone();
    Runtime::reset_logger();

    assert_eq!(captured.len(), 3);
    assert_eq!(captured[0].severity, LogSeverity::Debug);
    assert_eq!(captured[1].message, "value 2");
    assert!(captured[1].file.is_none());
    assert_eq!(captured[2].severity, LogSeverity::Error);
    assert_eq!(captured[2].file, Some(file!()));
    assert!(captured[2].line.is_some());
}

#[test]
#[serial]
fn test_bail_logs_and_returns_error() {
    let entries = capture("glcache::runtime_tests::bail");

    let result = failing_lookup("u_color");

    let captured = entries.lock().unwrap().clone();
    Runtime::reset_logger();

    assert_eq!(result, Err(Error::NotFound("no entry named 'u_color'".to_string())));
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert_eq!(captured[0].message, "no entry named 'u_color'");
}

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    let entries = capture("glcache::runtime_tests::reset");
    Runtime::reset_logger();

    Runtime::log(LogSeverity::Info, "glcache::runtime_tests::reset", "after reset".to_string());

    assert!(entries.lock().unwrap().is_empty());
}
