/// GL debug output - routes KHR_debug messages into the glcache logger
///
/// Installed by [`GlDevice::enable_debug_output`](crate::GlDevice::enable_debug_output).
/// Messages are filtered by severity, counted, grouped by text and logged
/// through the active `glcache` logger.

use colored::*;
use gl::types::{GLchar, GLenum, GLsizei, GLuint};
use rustc_hash::FxHashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

const SOURCE: &str = "glcache::GlDevice";

/// Global debug configuration (shared across callbacks)
static DEBUG_CONFIG: Mutex<Option<DebugConfig>> = Mutex::new(None);

/// Global message statistics
static DEBUG_STATS: DebugStatsTracker = DebugStatsTracker::new();

/// Global message tracker for grouping identical messages
static MESSAGE_TRACKER: Mutex<Option<MessageTracker>> = Mutex::new(None);

/// Distinct message texts remembered for grouping
const MAX_TRACKED_MESSAGES: usize = 1024;

/// Message severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugSeverity {
    Notification,
    Low,
    Medium,
    High,
}

impl DebugSeverity {
    fn from_raw(severity: GLenum) -> Self {
        match severity {
            gl::DEBUG_SEVERITY_HIGH => DebugSeverity::High,
            gl::DEBUG_SEVERITY_MEDIUM => DebugSeverity::Medium,
            gl::DEBUG_SEVERITY_LOW => DebugSeverity::Low,
            _ => DebugSeverity::Notification,
        }
    }
}

/// Debug output configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Least severe message that is logged
    pub min_severity: DebugSeverity,
    /// Abort on high severity messages (strict mode). The driver callback
    /// cannot unwind, so this terminates the process.
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            min_severity: DebugSeverity::Medium,
            panic_on_error: false,
            enable_stats: true,
        }
    }
}

/// Message counts since the debug output was enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugStats {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub notification: u32,
}

impl DebugStats {
    pub fn total(&self) -> u32 {
        self.high + self.medium + self.low + self.notification
    }
}

struct DebugStatsTracker {
    high: AtomicU32,
    medium: AtomicU32,
    low: AtomicU32,
    notification: AtomicU32,
}

impl DebugStatsTracker {
    const fn new() -> Self {
        Self {
            high: AtomicU32::new(0),
            medium: AtomicU32::new(0),
            low: AtomicU32::new(0),
            notification: AtomicU32::new(0),
        }
    }

    fn increment(&self, severity: DebugSeverity) {
        let counter = match severity {
            DebugSeverity::High => &self.high,
            DebugSeverity::Medium => &self.medium,
            DebugSeverity::Low => &self.low,
            DebugSeverity::Notification => &self.notification,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> DebugStats {
        DebugStats {
            high: self.high.load(Ordering::Relaxed),
            medium: self.medium.load(Ordering::Relaxed),
            low: self.low.load(Ordering::Relaxed),
            notification: self.notification.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.high.store(0, Ordering::Relaxed);
        self.medium.store(0, Ordering::Relaxed);
        self.low.store(0, Ordering::Relaxed);
        self.notification.store(0, Ordering::Relaxed);
    }
}

/// Occurrence counts per message text, bounded to `capacity` texts
struct MessageTracker {
    messages: FxHashMap<String, u32>,
    capacity: usize,
}

impl MessageTracker {
    fn new(capacity: usize) -> Self {
        Self {
            messages: FxHashMap::default(),
            capacity,
        }
    }

    /// Occurrences of `message` so far, this one included
    ///
    /// Once `capacity` texts are tracked, new texts are not remembered and
    /// always count as first occurrences.
    fn track_message(&mut self, message: &str) -> u32 {
        if let Some(count) = self.messages.get_mut(message) {
            *count = count.saturating_add(1);
            return *count;
        }
        if self.messages.len() < self.capacity {
            self.messages.insert(message.to_string(), 1);
        }
        1
    }

    fn repeated(&self) -> usize {
        self.messages.values().filter(|count| **count > 1).count()
    }
}

/// Install `config` and reset statistics
pub(crate) fn init_debug_config(config: DebugConfig) {
    DEBUG_STATS.reset();
    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(MessageTracker::new(MAX_TRACKED_MESSAGES));
    }
    if let Ok(mut slot) = DEBUG_CONFIG.lock() {
        *slot = Some(config);
    }
}

/// Current message statistics
pub fn get_debug_stats() -> DebugStats {
    DEBUG_STATS.get()
}

/// Print the message statistics to stderr
pub fn print_debug_stats_report() {
    let stats = get_debug_stats();

    if stats.total() == 0 {
        eprintln!("\n{}", "No GL debug messages".green().bold());
        return;
    }

    eprintln!("\n{}", "=== GL Debug Statistics ===".bright_blue().bold());
    if stats.high > 0 {
        eprintln!("  {} {}", "High:".red().bold(), stats.high);
    }
    if stats.medium > 0 {
        eprintln!("  {} {}", "Medium:".yellow().bold(), stats.medium);
    }
    if stats.low > 0 {
        eprintln!("  {} {}", "Low:".cyan(), stats.low);
    }
    if stats.notification > 0 {
        eprintln!("  {} {}", "Notification:".bright_black(), stats.notification);
    }
    eprintln!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        let repeated = tracker.as_ref().map_or(0, MessageTracker::repeated);
        if repeated > 0 {
            eprintln!("\n  {} message(s) appeared multiple times", repeated);
        }
        // Grouping restarts after each report
        if let Some(tracker) = tracker.as_mut() {
            *tracker = MessageTracker::new(MAX_TRACKED_MESSAGES);
        }
    }
}

fn source_name(source: GLenum) -> &'static str {
    match source {
        gl::DEBUG_SOURCE_API => "API",
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => "Window System",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "Shader Compiler",
        gl::DEBUG_SOURCE_THIRD_PARTY => "Third Party",
        gl::DEBUG_SOURCE_APPLICATION => "Application",
        _ => "Other",
    }
}

fn type_name(kind: GLenum) -> &'static str {
    match kind {
        gl::DEBUG_TYPE_ERROR => "Error",
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "Deprecated",
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "Undefined Behavior",
        gl::DEBUG_TYPE_PORTABILITY => "Portability",
        gl::DEBUG_TYPE_PERFORMANCE => "Performance",
        gl::DEBUG_TYPE_MARKER => "Marker",
        _ => "Other",
    }
}

/// Filter, count and log one message; returns the formatted text when the
/// message passed the filter
fn handle_message(source: GLenum, kind: GLenum, id: GLuint, severity: GLenum, message: &str) -> Option<String> {
    let config = DEBUG_CONFIG.lock().ok()?.clone()?;
    let severity = DebugSeverity::from_raw(severity);
    if severity < config.min_severity {
        return None;
    }

    let mut repeat = String::new();
    if config.enable_stats {
        DEBUG_STATS.increment(severity);
        if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
            let count = tracker
                .get_or_insert_with(|| MessageTracker::new(MAX_TRACKED_MESSAGES))
                .track_message(message);
            if count > 1 {
                repeat = format!(" [x{}]", count);
            }
        }
    }

    let text = format!("[{} / {} #{}]{} {}", source_name(source), type_name(kind), id, repeat, message);
    match severity {
        DebugSeverity::High => glcache::glc_error!(SOURCE, "{}", text),
        DebugSeverity::Medium => glcache::glc_warn!(SOURCE, "{}", text),
        DebugSeverity::Low => glcache::glc_info!(SOURCE, "{}", text),
        DebugSeverity::Notification => glcache::glc_debug!(SOURCE, "{}", text),
    }

    if config.panic_on_error && severity == DebugSeverity::High {
        panic!("GL debug error (strict mode): {}", text);
    }
    Some(text)
}

/// KHR_debug message callback
pub(crate) extern "system" fn gl_debug_callback(
    source: GLenum,
    kind: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user_param: *mut c_void,
) {
    if message.is_null() {
        return;
    }

    // Safety: the driver passes `length` valid bytes (or a NUL-terminated
    // string when `length` is negative) for the duration of the call
    let text = unsafe {
        if length >= 0 {
            let bytes = std::slice::from_raw_parts(message as *const u8, length as usize);
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            std::ffi::CStr::from_ptr(message).to_string_lossy().into_owned()
        }
    };
    handle_message(source, kind, id, severity, &text);
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
