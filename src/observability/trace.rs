//! Method tracing.
//!
//! Wraps a call and emits one `method-trace` record when it completes:
//! method name, parameters, duration and outcome. The wrapped call's result
//! (or panic) is passed through untouched.
//!
//! # Design Decisions
//! - A `Result::Err` or a panic is a failure; panics are re-raised with the
//!   original payload after logging
//! - A failing call traced at DEBUG is logged at WARN instead
//! - Object parameters are redacted here because they nest inside the record

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observability::logger::Logger;
use crate::observability::record::{LogAction, LogArg, LogLevel};

/// Structured body of a method-trace record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTrace {
    pub action: LogAction,
    pub method: String,
    pub class: String,
    pub function: String,
    pub parameters: Vec<Value>,
    pub has_failed: bool,
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Tells the tracer whether a return value represents a failure.
pub trait Outcome {
    /// Failure message, `None` on success.
    fn failure(&self) -> Option<String>;
}

impl<T, E: std::fmt::Display> Outcome for Result<T, E> {
    fn failure(&self) -> Option<String> {
        self.as_ref().err().map(|e| e.to_string())
    }
}

impl<T> Outcome for Option<T> {
    fn failure(&self) -> Option<String> {
        None
    }
}

impl Outcome for Value {
    fn failure(&self) -> Option<String> {
        None
    }
}

macro_rules! infallible_outcome {
    ($($ty:ty),*) => {
        $(
            impl Outcome for $ty {
                fn failure(&self) -> Option<String> {
                    None
                }
            }
        )*
    };
}

infallible_outcome!((), bool, String, i32, i64, u32, u64, usize, f64);

/// Emits method-trace records for one component.
#[derive(Debug, Clone)]
pub struct MethodTracer {
    logger: Logger,
    class: String,
    level: LogLevel,
}

impl MethodTracer {
    /// Tracer logging at DEBUG with `class` as the record's component.
    pub fn new(logger: &Logger, class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            logger: logger.for_component(class.clone()),
            class,
            level: LogLevel::Debug,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn trace<R, F>(&self, function: &str, params: Vec<Value>, f: F) -> R
    where
        F: FnOnce() -> R,
        R: Outcome,
    {
        let start = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => {
                self.finish(function, params, start, result.failure());
                result
            }
            Err(payload) => {
                self.finish(function, params, start, Some(panic_message(payload.as_ref())));
                panic::resume_unwind(payload)
            }
        }
    }

    pub async fn trace_async<R, Fut>(&self, function: &str, params: Vec<Value>, fut: Fut) -> R
    where
        Fut: Future<Output = R>,
        R: Outcome,
    {
        let start = Instant::now();
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => {
                self.finish(function, params, start, result.failure());
                result
            }
            Err(payload) => {
                self.finish(function, params, start, Some(panic_message(payload.as_ref())));
                panic::resume_unwind(payload)
            }
        }
    }

    /// Traced version of a one-argument function. The argument is serialized
    /// into the record's parameters; tuples become separate parameters.
    pub fn wrap<A, R, F>(&self, function: impl Into<String>, f: F) -> impl Fn(A) -> R
    where
        A: Serialize,
        F: Fn(A) -> R,
        R: Outcome,
    {
        let tracer = self.clone();
        let function = function.into();
        move |arg: A| {
            let params = vec![serde_json::to_value(&arg).unwrap_or(Value::Null)];
            tracer.trace(&function, params, || f(arg))
        }
    }

    /// Async counterpart of [`MethodTracer::wrap`].
    pub fn wrap_async<A, R, F, Fut>(
        &self,
        function: impl Into<String>,
        f: F,
    ) -> impl Fn(A) -> BoxFuture<'static, R>
    where
        A: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
        R: Outcome + Send + 'static,
    {
        let tracer = self.clone();
        let function = function.into();
        move |arg: A| {
            let params = vec![serde_json::to_value(&arg).unwrap_or(Value::Null)];
            let fut = f(arg);
            let tracer = tracer.clone();
            let function = function.clone();
            async move { tracer.trace_async(&function, params, fut).await }.boxed()
        }
    }

    fn finish(&self, function: &str, params: Vec<Value>, start: Instant, failure: Option<String>) {
        let level = match (&failure, self.level) {
            (Some(_), LogLevel::Debug) => LogLevel::Warn,
            (_, level) => level,
        };
        if !self.logger.enabled(level) {
            return;
        }

        let method = format!("{}.{}", self.class, function);
        let trace = LogTrace {
            action: LogAction::MethodTrace,
            method: method.clone(),
            class: self.class.clone(),
            function: function.to_string(),
            parameters: self.parameters(params),
            has_failed: failure.is_some(),
            duration: start.elapsed().as_millis() as u64,
            error_message: failure,
        };
        self.logger.log(
            level,
            vec![
                LogArg::from(format!("Called method: {method}")),
                LogArg::object(&trace),
            ],
        );
    }

    fn parameters(&self, params: Vec<Value>) -> Vec<Value> {
        let config = self.logger.config();
        let hidden = config.hidden_fields();
        let show_sensitive = config.runtime().show_sensitive;

        let mut out = Vec::with_capacity(params.len());
        let mut pending = params;
        pending.reverse();
        while let Some(param) = pending.pop() {
            match param {
                Value::Null => {}
                Value::Array(items) => pending.extend(items.into_iter().rev()),
                Value::Object(map) if !show_sensitive => out.push(Value::Object(hidden.redact(&map))),
                other => out.push(other),
            }
        }
        out
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
