//! Request-scoped context subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → store.rs (open a scope bound to the request's task)
//!     → correlation.rs (correlation id + extra log data in the LOGGER bucket)
//!     → any code awaited inside the scope reads the same bucket
//!
//! Every log call:
//!     → redaction.rs (snapshot of hidden field names)
//!     → formatter reads correlation id / extra data from the current scope
//! ```
//!
//! # Design Decisions
//! - Scope is bound to the async task via `tokio::task_local!`, never a global slot
//! - Reads and writes outside a scope are silent no-ops
//! - Hidden field list is an explicit, shared value swapped atomically on update

pub mod correlation;
pub mod redaction;
pub mod store;

pub use correlation::CorrelationContext;
pub use redaction::LoggerConfig;
pub use store::{ContextNamespace, ContextScope};
