//! Process-wide logger configuration: hidden fields and runtime defaults.
//!
//! # Responsibilities
//! - Own the ordered set of field names redacted from every record
//! - Hold the configured defaults that environment variables may override
//! - Resolve the effective settings for a single log call
//!
//! # Design Decisions
//! - Shared by `Arc`, never an ambient global
//! - Snapshots are swapped atomically (`arc-swap`): readers always see a
//!   complete list, writers never block them
//! - Field names are lower-cased on insert and matched case-insensitively

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::{Map, Value};

use crate::config::env::{EnvSource, ProcessEnv, RuntimeSettings};
use crate::config::schema::LoggingConfig;

/// Value written in place of a hidden field.
pub const HIDDEN_FIELD_PLACEHOLDER: &str = "***REDACTED***";

/// Immutable snapshot of the hidden field names.
#[derive(Debug, Clone, Default)]
pub struct HiddenFields(Arc<Vec<String>>);

impl HiddenFields {
    /// Whether `key` (any case) is hidden.
    pub fn contains(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.0.iter().any(|field| *field == key)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of `object` with hidden keys replaced by the placeholder.
    pub fn redact(&self, object: &Map<String, Value>) -> Map<String, Value> {
        object
            .iter()
            .map(|(key, value)| {
                if self.contains(key) {
                    (key.clone(), Value::String(HIDDEN_FIELD_PLACEHOLDER.to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }
}

/// Shared configuration read by every log call.
pub struct LoggerConfig {
    hidden_fields: ArcSwap<Vec<String>>,
    defaults: ArcSwap<LoggingConfig>,
    env: Arc<dyn EnvSource>,
}

impl LoggerConfig {
    /// Build from configured defaults, reading overrides from the process environment.
    pub fn new(defaults: LoggingConfig) -> Self {
        Self::with_env(defaults, Arc::new(ProcessEnv))
    }

    /// Build with a custom environment source.
    pub fn with_env(defaults: LoggingConfig, env: Arc<dyn EnvSource>) -> Self {
        let hidden = normalize(Vec::new(), defaults.hidden_fields.iter());
        Self {
            hidden_fields: ArcSwap::from_pointee(hidden),
            defaults: ArcSwap::from_pointee(defaults),
            env,
        }
    }

    /// Append fields to the hidden list. `None` is treated as an empty list.
    pub fn add_hidden_fields<I, S>(&self, fields: Option<I>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let incoming: Vec<String> = fields
            .into_iter()
            .flatten()
            .map(|f| f.as_ref().to_string())
            .collect();
        if incoming.is_empty() {
            return;
        }
        self.hidden_fields
            .rcu(|current| normalize((**current).clone(), incoming.iter()));
    }

    /// Replace the hidden list wholesale.
    pub fn set_hidden_fields<I, S>(&self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_string()).collect();
        self.hidden_fields
            .store(Arc::new(normalize(Vec::new(), fields.iter())));
    }

    /// Consistent snapshot of the hidden list.
    pub fn hidden_fields(&self) -> HiddenFields {
        HiddenFields(self.hidden_fields.load_full())
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden_fields().contains(key)
    }

    /// Replace defaults and hidden fields from a reloaded configuration.
    pub fn apply(&self, logging: &LoggingConfig) {
        self.set_hidden_fields(&logging.hidden_fields);
        self.defaults.store(Arc::new(logging.clone()));
    }

    /// Effective settings for one log call: environment first, then defaults.
    pub fn runtime(&self) -> RuntimeSettings {
        RuntimeSettings::resolve(self.env.as_ref(), &self.defaults.load())
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl std::fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("hidden_fields", &self.hidden_fields.load())
            .field("defaults", &self.defaults.load())
            .finish()
    }
}

fn normalize<'a, I, S>(mut base: Vec<String>, incoming: I) -> Vec<String>
where
    I: Iterator<Item = &'a S>,
    S: AsRef<str> + 'a,
{
    for field in incoming {
        let field = field.as_ref().trim().to_lowercase();
        if !field.is_empty() && !base.contains(&field) {
            base.push(field);
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> LoggerConfig {
        LoggerConfig::with_env(LoggingConfig::default(), Arc::new(HashMap::<String, String>::new()))
    }

    #[test]
    fn test_add_none_is_noop() {
        let cfg = config();
        cfg.add_hidden_fields(None::<Vec<String>>);
        assert!(cfg.hidden_fields().is_empty());
    }

    #[test]
    fn test_add_appends_lowercased_in_order() {
        let cfg = config();
        cfg.add_hidden_fields(Some(["Password", "token"]));
        cfg.add_hidden_fields(Some(vec!["PASSWORD", "cpf"]));
        assert_eq!(cfg.hidden_fields().as_slice(), ["password", "token", "cpf"]);
    }

    #[test]
    fn test_set_replaces() {
        let cfg = config();
        cfg.add_hidden_fields(Some(["password"]));
        cfg.set_hidden_fields(["secret"]);
        assert!(!cfg.is_hidden("password"));
        assert!(cfg.is_hidden("Secret"));
    }

    #[test]
    fn test_snapshot_unaffected_by_later_changes() {
        let cfg = config();
        cfg.set_hidden_fields(["password"]);
        let snapshot = cfg.hidden_fields();
        cfg.add_hidden_fields(Some(["user"]));
        assert!(!snapshot.contains("user"));
        assert!(cfg.is_hidden("user"));
    }

    #[test]
    fn test_redact_replaces_hidden_keys() {
        let cfg = config();
        cfg.set_hidden_fields(["password"]);
        let mut object = Map::new();
        object.insert("Password".into(), Value::from("x"));
        object.insert("user".into(), Value::from("y"));

        let redacted = cfg.hidden_fields().redact(&object);
        assert_eq!(redacted["Password"], Value::from(HIDDEN_FIELD_PLACEHOLDER));
        assert_eq!(redacted["user"], Value::from("y"));
    }

    #[test]
    fn test_defaults_seed_hidden_fields() {
        let mut logging = LoggingConfig::default();
        logging.hidden_fields = vec!["Authorization".into()];
        let cfg = LoggerConfig::with_env(logging, Arc::new(HashMap::<String, String>::new()));
        assert!(cfg.is_hidden("authorization"));
    }

    #[test]
    fn test_concurrent_readers_see_whole_lists() {
        let cfg = Arc::new(config());
        let writer = {
            let cfg = cfg.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    if i % 2 == 0 {
                        cfg.set_hidden_fields(["a", "b", "c"]);
                    } else {
                        cfg.set_hidden_fields(["x", "y", "z"]);
                    }
                }
            })
        };
        for _ in 0..200 {
            let snapshot = cfg.hidden_fields();
            let len = snapshot.as_slice().len();
            assert!(len == 0 || len == 3);
        }
        writer.join().unwrap();
    }
}
