//! Record sinks.
//!
//! A sink receives finished [`LogRecord`]s. Sinks never fail the caller:
//! write errors are dropped.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::observability::record::{LogLevel, LogRecord};

/// Destination for formatted records.
pub trait LogSink: Send + Sync {
    /// `local` selects human-readable output where the sink supports it.
    fn emit(&self, level: LogLevel, record: &LogRecord, local: bool);
}

/// One JSON object per line on stdout; indented when `local`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn render(record: &LogRecord, local: bool) -> String {
        let rendered = if local {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        };
        rendered.unwrap_or_else(|e| {
            format!(
                "{{\"level\":\"ERROR\",\"message\":\"unrenderable record: {}\"}}",
                e.to_string().replace('"', "'")
            )
        })
    }
}

impl LogSink for StdoutSink {
    fn emit(&self, _level: LogLevel, record: &LogRecord, local: bool) {
        let line = Self::render(record, local);
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = writeln!(out, "{line}");
    }
}

/// Forwards records to the `tracing` subscriber as events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: LogLevel, record: &LogRecord, _local: bool) {
        let fields = serde_json::to_string(&record.fields).unwrap_or_default();
        macro_rules! forward {
            ($lvl:expr) => {
                tracing::event!(
                    target: "correlog",
                    $lvl,
                    correlation_id = %record.correlation_id,
                    class = %record.class,
                    error_message = record.error_message.as_deref(),
                    fields = %fields,
                    "{}",
                    record.message
                )
            };
        }
        match level {
            LogLevel::Debug => forward!(tracing::Level::DEBUG),
            LogLevel::Info => forward!(tracing::Level::INFO),
            LogLevel::Warn => forward!(tracing::Level::WARN),
            LogLevel::Error => forward!(tracing::Level::ERROR),
        }
    }
}

/// Keeps records in memory for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Records whose correlation id equals `id`.
    pub fn with_correlation_id(&self, id: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.correlation_id == id)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn emit(&self, _level: LogLevel, record: &LogRecord, _local: bool) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn record(id: &str) -> LogRecord {
        let mut fields = Map::new();
        fields.insert("user".into(), json!("y"));
        LogRecord {
            level: "INFO".into(),
            message: "hello".into(),
            correlation_id: id.into(),
            class: "svc".into(),
            timestamp: "2024-01-01T00:00:00.000Z".into(),
            error_message: None,
            stack_error: None,
            fields,
        }
    }

    #[test]
    fn test_render_single_line_json() {
        let line = StdoutSink::render(&record("abc"), false);
        assert!(!line.contains('\n'));
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["correlationId"], json!("abc"));
        assert_eq!(value["user"], json!("y"));
    }

    #[test]
    fn test_render_pretty_when_local() {
        let line = StdoutSink::render(&record("abc"), true);
        assert!(line.contains('\n'));
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], json!("INFO"));
    }

    #[test]
    fn test_tracing_sink_without_subscriber() {
        let mut rec = record("abc");
        rec.error_message = Some("boom".into());
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            TracingSink.emit(level, &rec, false);
        }
    }

    #[test]
    fn test_memory_sink_filters_by_correlation_id() {
        let sink = MemorySink::new();
        sink.emit(LogLevel::Info, &record("a"), false);
        sink.emit(LogLevel::Info, &record("b"), false);
        sink.emit(LogLevel::Info, &record("a"), false);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.with_correlation_id("a").len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }
}
