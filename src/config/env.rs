//! Environment-driven overrides, resolved on every log call.

use std::collections::HashMap;

use crate::config::schema::LoggingConfig;
use crate::observability::record::LogLevel;

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_NODE_ENV: &str = "NODE_ENV";
pub const ENV_SHOW_SENSITIVE: &str = "SHOW_SENSITIVE_LOG";

/// Environment name selecting human-readable output.
pub const LOCAL_ENVIRONMENT: &str = "local";

/// Source of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Effective logger settings for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub level: LogLevel,
    pub local: bool,
    pub show_sensitive: bool,
}

impl RuntimeSettings {
    /// Environment values win over configured defaults.
    pub fn resolve(env: &dyn EnvSource, defaults: &LoggingConfig) -> Self {
        let level = env
            .var(ENV_LOG_LEVEL)
            .and_then(|v| v.to_lowercase().parse().ok())
            .or_else(|| defaults.level.to_lowercase().parse().ok())
            .unwrap_or(LogLevel::Debug);

        let environment = env
            .var(ENV_APP_ENV)
            .or_else(|| env.var(ENV_NODE_ENV))
            .unwrap_or_else(|| defaults.environment.clone());

        let show_sensitive = env
            .var(ENV_SHOW_SENSITIVE)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.show_sensitive);

        Self {
            level,
            local: environment.trim().eq_ignore_ascii_case(LOCAL_ENVIRONMENT),
            show_sensitive,
        }
    }
}
