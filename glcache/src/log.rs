//! Logging for GLCache
//!
//! Every failure path in the crate (rejected binds, failed allocations,
//! compile/link info logs, device-reported errors) is reported here, so a
//! custom [`Logger`] is how an application observes them. Entries carry the
//! emitting component as `source` (`glcache::Buffer`, `glcache::StateCache`,
//! ...) and errors carry the file:line of the call site.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Receiver of every log entry emitted by the crate
///
/// # Example
///
/// ```no_run
/// use glcache::glc::log::{Logger, LogEntry, LogSeverity};
///
/// /// Forwards only failures to stderr
/// struct FailureLogger;
///
/// impl Logger for FailureLogger {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity == LogSeverity::Error {
///             eprintln!("{}: {}", entry.source, entry.message);
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component, e.g. "glcache::Texture2D"
    pub source: String,
    pub message: String,
    /// Call site, set for errors only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// Entry stamped with the current time and no call site
    pub fn new(severity: LogSeverity, source: &str, message: String) -> Self {
        Self {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        }
    }

    /// Attach the call site
    pub fn at(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// `file:line` of the call site, if known
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-resource chatter (id assignment, skipped updates)
    Trace,
    Debug,
    Info,
    /// Recoverable misuse (dropped shadow copies, live references on drop)
    Warn,
    /// Rejected operations and device-reported errors
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by [`DefaultLogger`]
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn painted(&self) -> ColoredString {
        match self {
            LogSeverity::Trace => self.label().bright_black(),
            LogSeverity::Debug => self.label().cyan(),
            LogSeverity::Info => self.label().green(),
            LogSeverity::Warn => self.label().yellow(),
            LogSeverity::Error => self.label().red().bold(),
        }
    }
}

/// Colored console logger
///
/// Prints `[timestamp] [SEVERITY] [source] message`, followed by
/// `(file:line)` for errors. Entries below the minimum severity are dropped;
/// the default minimum is `Debug`, which hides per-resource trace output.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self { min_severity: LogSeverity::Debug }
    }
}

impl DefaultLogger {
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Console line for `entry`, `None` when it is filtered out
    pub fn format(&self, entry: &LogEntry) -> Option<String> {
        if entry.severity < self.min_severity {
            return None;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            datetime.format("%Y-%m-%d %H:%M:%S%.3f"),
            entry.severity.painted(),
            entry.source.bright_blue(),
            entry.message
        );
        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }
        Some(line)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if let Some(line) = self.format(entry) {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
#[macro_export]
macro_rules! glc_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::glc::Runtime::log($crate::glc::log::LogSeverity::Trace, $source, format!($($arg)*))
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! glc_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::glc::Runtime::log($crate::glc::log::LogSeverity::Debug, $source, format!($($arg)*))
    };
}

/// Log an INFO message
///
/// ```ignore
/// glc_info!("glcache::Implementation", "Renderer: {}", renderer);
/// ```
#[macro_export]
macro_rules! glc_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::glc::Runtime::log($crate::glc::log::LogSeverity::Info, $source, format!($($arg)*))
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! glc_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::glc::Runtime::log($crate::glc::log::LogSeverity::Warn, $source, format!($($arg)*))
    };
}

/// Log an ERROR message with the call site attached
///
/// ```ignore
/// glc_error!("glcache::Buffer", "failed to create buffer: {}", desc);
/// ```
#[macro_export]
macro_rules! glc_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::glc::Runtime::log_detailed(
            $crate::glc::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
