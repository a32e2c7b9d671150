//! Scope isolation across interleaved and spawned tasks.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use tokio::sync::Barrier;

use correlog::context::store::{self, propagate, run_scoped, ContextNamespace};
use correlog::context::CorrelationContext;
use correlog::log_info;

mod common;

const NS: ContextNamespace = ContextNamespace::Logger;

#[tokio::test]
async fn test_interleaved_scopes_never_share_values() {
    let barrier = Arc::new(Barrier::new(16));

    let tasks = (0..16).map(|i| {
        let barrier = barrier.clone();
        run_scoped(NS, async move {
            store::set_value(NS, "owner", i);
            CorrelationContext::set_correlation_id(format!("id-{i}"));
            // every scope has written before any scope reads
            barrier.wait().await;
            tokio::time::sleep(Duration::from_millis((16 - i) as u64)).await;
            (
                i,
                store::get_value(NS, "owner"),
                CorrelationContext::correlation_id(),
            )
        })
    });

    for (i, owner, correlation_id) in join_all(tasks).await {
        assert_eq!(owner, Some(json!(i)));
        assert_eq!(correlation_id, Some(format!("id-{i}")));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_descendants_share_the_scope() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            tokio::spawn(run_scoped(NS, async move {
                CorrelationContext::set_correlation_id(format!("parent-{i}"));
                let child = tokio::spawn(propagate(async {
                    tokio::task::yield_now().await;
                    CorrelationContext::correlation_id()
                }));
                let orphan = tokio::spawn(async { CorrelationContext::correlation_id() });
                (i, child.await.unwrap(), orphan.await.unwrap())
            }))
        })
        .collect();

    for handle in handles {
        let (i, child, orphan) = handle.await.unwrap();
        assert_eq!(child, Some(format!("parent-{i}")));
        assert_eq!(orphan, None);
    }
}

#[tokio::test]
async fn test_logs_from_interleaved_scopes_are_attributed_correctly() {
    let (logger, sink) = common::test_logger(&[]);

    let tasks = (0..10).map(|i| {
        let logger = logger.clone();
        run_scoped(NS, async move {
            CorrelationContext::set_correlation_id(format!("log-{i}"));
            CorrelationContext::set_log_info_data("worker", i);
            for step in 0..3 {
                tokio::task::yield_now().await;
                log_info!(logger, "step", step);
            }
        })
    });
    join_all(tasks).await;

    let records = sink.records();
    assert_eq!(records.len(), 30);
    for record in records {
        let worker = record.field("worker").and_then(|w| w.as_u64()).unwrap();
        assert_eq!(record.correlation_id, format!("log-{worker}"));
        assert_eq!(record.class, "context_isolation");
    }
}

#[tokio::test]
async fn test_nested_scope_restores_outer() {
    run_scoped(NS, async {
        CorrelationContext::set_correlation_id("outer");
        let outer_id = store::get_value(NS, store::SCOPE_ID_KEY);

        run_scoped(NS, async {
            assert_eq!(CorrelationContext::correlation_id(), None);
            CorrelationContext::set_correlation_id("inner");
            assert_ne!(store::get_value(NS, store::SCOPE_ID_KEY), outer_id);
        })
        .await;

        assert_eq!(CorrelationContext::correlation_id().as_deref(), Some("outer"));
        assert_eq!(store::get_value(NS, store::SCOPE_ID_KEY), outer_id);
    })
    .await;
}
