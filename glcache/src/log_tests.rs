use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use std::sync::Mutex;

// ============================================================================
// Entries
// ============================================================================

#[test]
fn test_entry_without_call_site() {
    let entry = LogEntry::new(LogSeverity::Trace, "glcache::Resource", "assigned id 7".to_string());

    assert_eq!(entry.source, "glcache::Resource");
    assert_eq!(entry.message, "assigned id 7");
    assert!(entry.location().is_none());
}

#[test]
fn test_entry_call_site() {
    let entry = LogEntry::new(LogSeverity::Error, "glcache::Buffer", "tried to bind buffer 0".to_string())
        .at("glcache/src/resource/buffer.rs", 146);

    assert_eq!(entry.file, Some("glcache/src/resource/buffer.rs"));
    assert_eq!(entry.line, Some(146));
    assert_eq!(entry.location().as_deref(), Some("glcache/src/resource/buffer.rs:146"));
}

#[test]
fn test_severity_labels_have_equal_width() {
    let severities = [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ];
    assert!(severities.iter().all(|severity| severity.label().len() == 5));
    assert!(severities.windows(2).all(|pair| pair[0] < pair[1]));
}

// ============================================================================
// Default logger
// ============================================================================

#[test]
fn test_default_logger_hides_trace() {
    let logger = DefaultLogger::default();
    let trace = LogEntry::new(LogSeverity::Trace, "glcache::Resource", "assigned id 1".to_string());
    let debug = LogEntry::new(LogSeverity::Debug, "glcache::Implementation", "42 extensions".to_string());

    assert_eq!(logger.min_severity(), LogSeverity::Debug);
    assert!(logger.format(&trace).is_none());
    assert!(logger.format(&debug).is_some());
}

#[test]
fn test_min_severity_filters_below() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Warn);

    for (severity, shown) in [
        (LogSeverity::Info, false),
        (LogSeverity::Warn, true),
        (LogSeverity::Error, true),
    ] {
        let entry = LogEntry::new(severity, "glcache::StateCache", "message".to_string());
        assert_eq!(logger.format(&entry).is_some(), shown, "{:?}", severity);
    }
}

#[test]
fn test_format_includes_source_message_and_call_site() {
    let logger = DefaultLogger::default();
    let entry = LogEntry::new(LogSeverity::Error, "glcache::ShaderProgram", "failed to link: 0:3 error".to_string())
        .at("shader_program.rs", 210);

    let line = logger.format(&entry).unwrap();

    assert!(line.contains("glcache::ShaderProgram"));
    assert!(line.contains("ERROR"));
    assert!(line.ends_with("failed to link: 0:3 error (shader_program.rs:210)"));
}

#[test]
fn test_format_without_call_site_ends_with_message() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Trace);
    let entry = LogEntry::new(LogSeverity::Info, "glcache::Implementation", "Captured Mock / Mock".to_string());

    let line = logger.format(&entry).unwrap();

    assert!(line.ends_with("Captured Mock / Mock"));
}

// ============================================================================
// Custom loggers
// ============================================================================

/// Keeps only the messages of one component
struct SourceFilter {
    source: &'static str,
    kept: Mutex<Vec<String>>,
}

impl Logger for SourceFilter {
    fn log(&self, entry: &LogEntry) {
        if entry.source == self.source {
            self.kept.lock().unwrap().push(entry.message.clone());
        }
    }
}

#[test]
fn test_custom_logger_sees_entries_by_source() {
    let logger = SourceFilter { source: "glcache::Texture2D", kept: Mutex::new(Vec::new()) };

    logger.log(&LogEntry::new(LogSeverity::Error, "glcache::Buffer", "buffer".to_string()));
    logger.log(&LogEntry::new(LogSeverity::Error, "glcache::Texture2D", "texture".to_string()));

    assert_eq!(*logger.kept.lock().unwrap(), vec!["texture".to_string()]);
}

#[test]
fn test_loggers_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<SourceFilter>();
}
