//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Logger defaults and redaction list.
    pub logging: LoggingConfig,

    /// Request/response capture settings.
    pub capture: CaptureConfig,

    /// Administrative API settings.
    pub admin: AdminConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Logger defaults. Each value can be overridden per call by the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level (debug, info, warn, error). Overridden by `LOG_LEVEL`.
    pub level: String,

    /// Deployment environment; "local" selects pretty output. Overridden by `APP_ENV`.
    pub environment: String,

    /// Disable redaction. Overridden by `SHOW_SENSITIVE_LOG`.
    pub show_sensitive: bool,

    /// Field names replaced by a placeholder in every record.
    pub hidden_fields: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            environment: "production".to_string(),
            show_sensitive: false,
            hidden_fields: Vec::new(),
        }
    }
}

/// Request/response capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Header carrying the correlation id, inbound and outbound.
    pub correlation_header: String,

    /// Emit a DEBUG `request` record when a request is correlated.
    pub log_requests: bool,

    /// Include response headers in the response record.
    pub include_headers: bool,

    /// Bodies larger than this are summarized instead of logged.
    pub max_body_bytes: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            correlation_header: "correlationId".to_string(),
            log_requests: false,
            include_headers: true,
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Administrative API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount `/admin` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
