//! Structured logging subsystem.
//!
//! # Data Flow
//! ```text
//! log_info!(logger, "text", 42, json!({..}), LogArg::error(&e))
//!     → logger.rs    (level threshold, call-site capture)
//!     → caller.rs    (class = component or calling file)
//!     → formatter.rs (message, merged fields, redaction, correlation id)
//!     → sink.rs      (stdout JSON line / tracing event / memory)
//!
//! MethodTracer (trace.rs) and the HTTP capture layer build their records
//! through the same Logger.
//! ```
//!
//! # Design Decisions
//! - One record shape for every event (`LogRecord`)
//! - Correlation id and extra data come from the current context scope
//! - Process diagnostics go through `tracing` (logging.rs), not the Logger

pub mod caller;
pub mod formatter;
pub mod logger;
pub mod logging;
pub mod record;
pub mod sink;
pub mod trace;

pub use caller::CallSite;
pub use logger::Logger;
pub use record::{LogAction, LogArg, LogLevel, LogRecord};
pub use sink::{LogSink, MemorySink, StdoutSink, TracingSink};
pub use trace::{LogTrace, MethodTracer, Outcome};
