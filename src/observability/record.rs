//! Log levels, heterogeneous log arguments and the canonical record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub const FIELD_LEVEL: &str = "level";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_CORRELATION_ID: &str = "correlationId";
pub const FIELD_CLASS: &str = "class";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_ERROR_MESSAGE: &str = "errorMessage";
pub const FIELD_STACK_ERROR: &str = "stackError";
pub const FIELD_ACTION: &str = "action";

/// Side key for arguments that are neither text, errors nor objects.
pub const FIELD_OTHER_DATA: &str = "__data";

/// Keys lifted out of the merged field map into [`LogRecord`] itself.
pub const RESERVED_FIELDS: [&str; 7] = [
    FIELD_LEVEL,
    FIELD_MESSAGE,
    FIELD_CORRELATION_ID,
    FIELD_CLASS,
    FIELD_TIMESTAMP,
    FIELD_ERROR_MESSAGE,
    FIELD_STACK_ERROR,
];

/// Severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Upper-case label written into records.
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Kind of structured event a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogAction {
    MethodTrace,
    Request,
    Response,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::MethodTrace => "method-trace",
            LogAction::Request => "request",
            LogAction::Response => "response",
        }
    }
}

/// One argument passed to a log call.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Text(String),
    Number(Number),
    /// Missing value; rendered as the text `"null"`.
    Null,
    Error {
        message: String,
        stack: Option<String>,
    },
    Object(Map<String, Value>),
    Array(Vec<LogArg>),
    Other(Value),
}

impl LogArg {
    /// Flatten an error into message + source chain.
    pub fn error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let message = err.to_string();
        let mut stack = message.clone();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        LogArg::Error {
            message,
            stack: Some(stack),
        }
    }

    /// Serialize any value into an argument. Serialization failures degrade
    /// to an `Other` argument describing the failure.
    pub fn object<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(value) => LogArg::from(value),
            Err(e) => LogArg::Other(Value::String(format!("<unserializable: {e}>"))),
        }
    }

    /// Single-key object argument.
    pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(key.into(), value.into());
        LogArg::Object(map)
    }
}

impl From<Value> for LogArg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => LogArg::Null,
            Value::String(s) => LogArg::Text(s),
            Value::Number(n) => LogArg::Number(n),
            Value::Object(map) => LogArg::Object(map),
            Value::Array(items) => LogArg::Array(items.into_iter().map(LogArg::from).collect()),
            other @ Value::Bool(_) => LogArg::Other(other),
        }
    }
}

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        LogArg::Text(value.to_string())
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        LogArg::Text(value)
    }
}

impl From<&String> for LogArg {
    fn from(value: &String) -> Self {
        LogArg::Text(value.clone())
    }
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        LogArg::Other(Value::Bool(value))
    }
}

impl From<Map<String, Value>> for LogArg {
    fn from(value: Map<String, Value>) -> Self {
        LogArg::Object(value)
    }
}

impl<T: Into<LogArg>> From<Option<T>> for LogArg {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(LogArg::Null)
    }
}

impl<T: Into<LogArg>> From<Vec<T>> for LogArg {
    fn from(value: Vec<T>) -> Self {
        LogArg::Array(value.into_iter().map(Into::into).collect())
    }
}

macro_rules! number_arg {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for LogArg {
                fn from(value: $ty) -> Self {
                    LogArg::Number(Number::from(value))
                }
            }
        )*
    };
}

number_arg!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for LogArg {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(LogArg::Number)
            .unwrap_or_else(|| LogArg::Text(value.to_string()))
    }
}

impl From<f32> for LogArg {
    fn from(value: f32) -> Self {
        LogArg::from(f64::from(value))
    }
}

/// Canonical structured record handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    pub correlation_id: String,
    pub class: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_error: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// Merged field by name (reserved keys excluded).
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn action(&self) -> Option<&str> {
        self.fields.get(FIELD_ACTION).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
