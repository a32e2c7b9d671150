//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated)
//!     → LoggerConfig (hidden fields + logging defaults, shared via Arc)
//!
//! Every log call:
//!     env.rs reads LOG_LEVEL / APP_ENV / SHOW_SENSITIVE_LOG
//!     → overrides the logging defaults for that call only
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → LoggerConfig::apply swaps hidden fields and defaults
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Environment is read per log call, not cached at startup
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use env::{EnvSource, ProcessEnv, RuntimeSettings};
pub use loader::{load_config, ConfigError};
pub use schema::{AdminConfig, AppConfig, CaptureConfig, LoggingConfig, ServerConfig};
