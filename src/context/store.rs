//! Per-execution context store.
//!
//! # Responsibilities
//! - Open a scope whose map is visible to everything awaited inside it
//! - Get/set individual keys of a namespace bucket in the current scope
//! - Carry the scope into spawned descendants on request
//!
//! # Design Decisions
//! - `tokio::task_local!` binds the scope to the future, so it survives
//!   suspension points and never leaks into concurrently polled futures
//! - Each scope is seeded with a fresh `id` so two scopes are always distinct
//! - Nested scopes shadow the outer one and restore it on exit (no merge)

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Key under which every scope bucket stores its generated identifier.
pub const SCOPE_ID_KEY: &str = "id";

/// Logical context bucket inside a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextNamespace {
    /// Correlation id and extra log data.
    Logger,
}

/// Execution-bound container of namespace buckets.
#[derive(Debug, Default)]
pub struct ContextScope {
    buckets: DashMap<ContextNamespace, Map<String, Value>>,
}

impl ContextScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope whose `namespace` bucket is seeded with a fresh id.
    pub fn seeded(namespace: ContextNamespace) -> Arc<Self> {
        let scope = Self::new();
        let mut bucket = Map::new();
        bucket.insert(
            SCOPE_ID_KEY.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        scope.buckets.insert(namespace, bucket);
        Arc::new(scope)
    }

    /// Generated identifier of the given bucket, if seeded.
    pub fn id(&self, namespace: ContextNamespace) -> Option<String> {
        self.get(namespace, SCOPE_ID_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn get(&self, namespace: ContextNamespace, key: &str) -> Option<Value> {
        self.buckets
            .get(&namespace)
            .and_then(|bucket| bucket.get(key).cloned())
    }

    pub fn set(&self, namespace: ContextNamespace, key: &str, value: Value) {
        self.buckets
            .entry(namespace)
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Copy of the whole bucket (empty when the namespace was never written).
    pub fn bucket(&self, namespace: ContextNamespace) -> Map<String, Value> {
        self.buckets
            .get(&namespace)
            .map(|bucket| bucket.value().clone())
            .unwrap_or_default()
    }

    /// Replace the whole bucket.
    pub fn replace_bucket(&self, namespace: ContextNamespace, bucket: Map<String, Value>) {
        self.buckets.insert(namespace, bucket);
    }

    /// Apply `f` to the bucket in place, creating it if needed.
    pub fn update<R>(
        &self,
        namespace: ContextNamespace,
        f: impl FnOnce(&mut Map<String, Value>) -> R,
    ) -> R {
        let mut bucket = self.buckets.entry(namespace).or_default();
        f(bucket.value_mut())
    }
}

tokio::task_local! {
    static ACTIVE_SCOPE: Arc<ContextScope>;
}

/// Run `fut` inside a brand new scope seeded for `namespace`.
pub async fn run_scoped<F>(namespace: ContextNamespace, fut: F) -> F::Output
where
    F: Future,
{
    ACTIVE_SCOPE.scope(ContextScope::seeded(namespace), fut).await
}

/// Synchronous counterpart of [`run_scoped`].
pub fn run_scoped_sync<R>(namespace: ContextNamespace, f: impl FnOnce() -> R) -> R {
    ACTIVE_SCOPE.sync_scope(ContextScope::seeded(namespace), f)
}

/// Run `fut` inside an existing scope.
pub async fn within_scope<F>(scope: Arc<ContextScope>, fut: F) -> F::Output
where
    F: Future,
{
    ACTIVE_SCOPE.scope(scope, fut).await
}

/// Run `f` synchronously inside an existing scope.
///
/// Used where work belonging to a request runs outside the request's future,
/// e.g. while the server polls the response body.
pub fn enter_scope<R>(scope: Arc<ContextScope>, f: impl FnOnce() -> R) -> R {
    ACTIVE_SCOPE.sync_scope(scope, f)
}

/// Handle to the scope active on the current task, if any.
pub fn current_scope() -> Option<Arc<ContextScope>> {
    ACTIVE_SCOPE.try_with(Arc::clone).ok()
}

/// Bind the current scope (if any) to `fut`, typically before `tokio::spawn`.
pub fn propagate<F>(fut: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let scope = current_scope();
    async move {
        match scope {
            Some(scope) => ACTIVE_SCOPE.scope(scope, fut).await,
            None => fut.await,
        }
    }
}

/// Set `key` in the current scope's bucket. No-op outside a scope.
pub fn set_value(namespace: ContextNamespace, key: &str, value: impl Into<Value>) {
    let value = value.into();
    let _ = ACTIVE_SCOPE.try_with(|scope| scope.set(namespace, key, value));
}

/// Read `key` from the current scope's bucket. `None` outside a scope.
pub fn get_value(namespace: ContextNamespace, key: &str) -> Option<Value> {
    ACTIVE_SCOPE
        .try_with(|scope| scope.get(namespace, key))
        .ok()
        .flatten()
}

/// Copy of the current scope's bucket, empty outside a scope.
pub fn get_context(namespace: ContextNamespace) -> Map<String, Value> {
    ACTIVE_SCOPE
        .try_with(|scope| scope.bucket(namespace))
        .unwrap_or_default()
}

/// Replace the current scope's bucket. No-op outside a scope.
pub fn set_context(namespace: ContextNamespace, bucket: Map<String, Value>) {
    let _ = ACTIVE_SCOPE.try_with(|scope| scope.replace_bucket(namespace, bucket));
}

/// Apply `f` to the current scope's bucket. Returns `None` outside a scope.
pub fn update_context<R>(
    namespace: ContextNamespace,
    f: impl FnOnce(&mut Map<String, Value>) -> R,
) -> Option<R> {
    ACTIVE_SCOPE
        .try_with(|scope| scope.update(namespace, f))
        .ok()
}
