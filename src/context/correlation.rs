//! Correlation context accessors.
//!
//! Typed layer over the context store: everything lives in the
//! [`ContextNamespace::Logger`] bucket of the current scope.

use serde_json::{Map, Value};

use crate::context::store::{self, ContextNamespace};

/// Bucket key holding the request's correlation id.
pub const CORRELATION_ID_KEY: &str = "correlationId";

/// Bucket key holding the extra log data object.
pub const EXTRA_LOG_INFO_KEY: &str = "extraLogInfo";

/// Correlation id and extra log data of the current scope.
pub struct CorrelationContext;

impl CorrelationContext {
    /// Set the correlation id for the current scope.
    ///
    /// The first id written wins; later writes in the same scope are ignored.
    /// Returns `true` when the id was stored.
    pub fn set_correlation_id(id: impl Into<String>) -> bool {
        let id = id.into();
        store::update_context(ContextNamespace::Logger, |bucket| {
            if bucket.contains_key(CORRELATION_ID_KEY) {
                false
            } else {
                bucket.insert(CORRELATION_ID_KEY.to_string(), Value::String(id));
                true
            }
        })
        .unwrap_or(false)
    }

    /// Correlation id of the current scope, `None` outside a scope or before it is set.
    pub fn correlation_id() -> Option<String> {
        store::get_value(ContextNamespace::Logger, CORRELATION_ID_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Attach `key = value` to every record logged in the current scope.
    pub fn set_log_info_data(key: &str, value: impl Into<Value>) {
        let value = value.into();
        store::update_context(ContextNamespace::Logger, |bucket| {
            let extra = bucket
                .entry(EXTRA_LOG_INFO_KEY.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !extra.is_object() {
                *extra = Value::Object(Map::new());
            }
            if let Value::Object(map) = extra {
                map.insert(key.to_string(), value);
            }
        });
    }

    /// Extra log data of the current scope (empty when none).
    pub fn log_info_data() -> Map<String, Value> {
        match store::get_value(ContextNamespace::Logger, EXTRA_LOG_INFO_KEY) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
