//! HTTP request/response capture.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs (open scope, correlate, optional request record)
//!     → routing; record_route leaves the matched route and params in the scope
//!     → handler (logs carry the request's correlation id)
//!     → middleware.rs (correlation header on the response)
//!     → capture.rs (body frames retained; response record before the last frame)
//!     → Send to client
//! ```

pub mod capture;
pub mod middleware;
pub mod response_log;
pub mod server;

pub use capture::CaptureBody;
pub use middleware::{record_route, CorrelationId, RequestLogLayer, RequestLogService};
pub use response_log::{RequestLog, ResponseLog};
pub use server::{build_router, HttpServer};
