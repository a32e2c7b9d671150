//! Request-scoped structured logging.
//!
//! Every log line carries the correlation id of the request it belongs to,
//! the component that wrote it, and the caller's data with sensitive keys
//! redacted. HTTP request/response capture and method tracing build on the
//! same logger.

pub mod admin;
pub mod config;
pub mod context;
pub mod http;
pub mod observability;

pub use config::schema::AppConfig;
pub use context::{CorrelationContext, LoggerConfig};
pub use http::{HttpServer, RequestLogLayer};
pub use observability::{LogArg, LogLevel, Logger, MethodTracer};
