/// GLCache runtime - process-wide logger registry
///
/// Holds the one piece of global state the crate needs besides the resource
/// id counter and the implementation snapshot: the active logger. Access is
/// guarded by an RwLock so logging from producer threads (enqueueing
/// updates) and from the device thread is safe.

use std::sync::{OnceLock, RwLock};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (a `DefaultLogger` until replaced)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

/// Process-wide runtime services
///
/// # Example
///
/// ```no_run
/// use glcache::glc::{Runtime, log::{Logger, LogEntry}};
///
/// struct FileLogger;
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// Runtime::set_logger(FileLogger);
/// ```
pub struct Runtime;

impl Runtime {
    /// Replace the active logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Go back to the default console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Logging entry point used by the glc_trace!..glc_warn! macros
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level
    /// * `source` - Source module (e.g., "glcache::StateCache")
    /// * `message` - Log message
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry::new(severity, source, message));
        }
    }

    /// Logging entry point with file:line information (used by glc_error!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry::new(severity, source, message).at(file, line));
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
