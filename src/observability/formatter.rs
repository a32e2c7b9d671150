//! Log formatter: heterogeneous arguments → one [`LogRecord`].
//!
//! # Responsibilities
//! - Join textual arguments into a single message
//! - Merge object arguments into the record, redacting hidden keys
//! - Flatten errors into `errorMessage` / `stackError`
//! - Attach correlation id, scope extra data, call-site class and timestamp
//!
//! # Design Decisions
//! - Pure over its inputs plus the current scope; never panics
//! - Explicit call data wins over scope extra data on key collisions
//! - Missing values render as the text `"null"`

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context::redaction::HiddenFields;
use crate::context::CorrelationContext;
use crate::observability::record::{
    LogArg, LogLevel, LogRecord, FIELD_ERROR_MESSAGE, FIELD_OTHER_DATA, FIELD_STACK_ERROR,
    RESERVED_FIELDS,
};

/// Per-call inputs that do not come from the arguments or the scope.
#[derive(Debug, Clone, Default)]
pub struct FormatContext {
    pub hidden: HiddenFields,
    pub show_sensitive: bool,
    pub class: String,
}

/// Build the record for one log call.
pub fn format(level: LogLevel, args: &[LogArg], ctx: &FormatContext) -> LogRecord {
    let mut message = String::new();
    let mut fields = Map::new();

    for arg in args {
        absorb(arg, ctx, &mut message, &mut fields);
    }

    let correlation_id =
        CorrelationContext::correlation_id().unwrap_or_else(|| Uuid::new_v4().to_string());

    for (key, value) in CorrelationContext::log_info_data() {
        fields.entry(key).or_insert(value);
    }

    let error_message = fields.remove(FIELD_ERROR_MESSAGE).map(into_text);
    let stack_error = fields.remove(FIELD_STACK_ERROR).map(into_text);
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }

    LogRecord {
        level: level.label(),
        message,
        correlation_id,
        class: ctx.class.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        error_message,
        stack_error,
        fields,
    }
}

fn absorb(arg: &LogArg, ctx: &FormatContext, message: &mut String, fields: &mut Map<String, Value>) {
    match arg {
        LogArg::Text(text) => append(message, text),
        LogArg::Number(number) => append(message, &number.to_string()),
        LogArg::Null => append(message, "null"),
        LogArg::Error { message: text, stack } => {
            fields.insert(FIELD_ERROR_MESSAGE.to_string(), Value::String(text.clone()));
            match stack {
                Some(stack) => {
                    fields.insert(FIELD_STACK_ERROR.to_string(), Value::String(stack.clone()));
                }
                None => {
                    fields.remove(FIELD_STACK_ERROR);
                }
            }
        }
        LogArg::Object(object) => {
            let merged = if ctx.show_sensitive {
                object.clone()
            } else {
                ctx.hidden.redact(object)
            };
            fields.extend(merged);
        }
        LogArg::Array(items) => {
            for item in items {
                absorb(item, ctx, message, fields);
            }
        }
        LogArg::Other(value) => {
            fields.insert(FIELD_OTHER_DATA.to_string(), value.clone());
        }
    }
}

fn append(message: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !message.is_empty() {
        message.push(' ');
    }
    message.push_str(text);
}

fn into_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
