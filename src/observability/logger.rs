//! Logger facade.
//!
//! # Responsibilities
//! - Apply the level threshold before any formatting work
//! - Attribute the call site and format the record
//! - Hand the record to the configured sink
//!
//! # Design Decisions
//! - Cheap to clone: configuration and sink are shared by `Arc`
//! - Every entry point is `#[track_caller]` so the record's `class` names the
//!   caller, not this module
//! - Never returns errors and never panics on bad input

use std::sync::Arc;

use crate::context::redaction::LoggerConfig;
use crate::observability::caller::{resolve_class, CallSite};
use crate::observability::formatter::{self, FormatContext};
use crate::observability::record::{LogArg, LogLevel};
use crate::observability::sink::{LogSink, StdoutSink};

#[derive(Clone)]
pub struct Logger {
    config: Arc<LoggerConfig>,
    sink: Arc<dyn LogSink>,
    component: Option<Arc<str>>,
}

impl Logger {
    pub fn new(config: Arc<LoggerConfig>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            config,
            sink,
            component: None,
        }
    }

    /// Logger writing JSON lines to stdout.
    pub fn stdout(config: Arc<LoggerConfig>) -> Self {
        Self::new(config, Arc::new(StdoutSink))
    }

    /// Same configuration and sink, with an explicit component name for `class`.
    pub fn for_component(&self, component: impl Into<String>) -> Self {
        let component: String = component.into();
        Self {
            config: self.config.clone(),
            sink: self.sink.clone(),
            component: Some(Arc::from(component)),
        }
    }

    pub fn config(&self) -> &Arc<LoggerConfig> {
        &self.config
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Whether a record at `level` would currently be emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.config.runtime().level
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, args: Vec<LogArg>) {
        let site = CallSite::capture();
        self.log_at(level, args, &site);
    }

    /// Log with a call site captured further up the stack.
    pub fn log_at(&self, level: LogLevel, args: Vec<LogArg>, site: &CallSite) {
        let runtime = self.config.runtime();
        if level < runtime.level {
            return;
        }

        let ctx = FormatContext {
            hidden: self.config.hidden_fields(),
            show_sensitive: runtime.show_sensitive,
            class: resolve_class(self.component.as_deref(), site),
        };
        let record = formatter::format(level, &args, &ctx);
        self.sink.emit(level, &record, runtime.local);
    }

    #[track_caller]
    pub fn debug(&self, args: Vec<LogArg>) {
        self.log(LogLevel::Debug, args)
    }

    #[track_caller]
    pub fn info(&self, args: Vec<LogArg>) {
        self.log(LogLevel::Info, args)
    }

    #[track_caller]
    pub fn warn(&self, args: Vec<LogArg>) {
        self.log(LogLevel::Warn, args)
    }

    #[track_caller]
    pub fn error(&self, args: Vec<LogArg>) {
        self.log(LogLevel::Error, args)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("component", &self.component)
            .finish()
    }
}

/// Log at DEBUG with heterogeneous arguments.
///
/// ```ignore
/// log_debug!(logger, "user", user_id, serde_json::json!({"plan": "pro"}));
/// ```
#[macro_export]
macro_rules! log_debug {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.debug(vec![$($crate::observability::LogArg::from($arg)),*])
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.info(vec![$($crate::observability::LogArg::from($arg)),*])
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.warn(vec![$($crate::observability::LogArg::from($arg)),*])
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.error(vec![$($crate::observability::LogArg::from($arg)),*])
    };
}
