//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio::net::TcpListener;

use correlog::config::{AppConfig, LoggingConfig};
use correlog::context::LoggerConfig;
use correlog::http::build_router;
use correlog::observability::{Logger, LogRecord, MemorySink};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Logger writing into memory, isolated from the process environment.
pub fn test_logger(env: &[(&str, &str)]) -> (Logger, MemorySink) {
    let env: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Arc::new(LoggerConfig::with_env(LoggingConfig::default(), Arc::new(env)));
    let sink = MemorySink::new();
    (Logger::new(config, Arc::new(sink.clone())), sink)
}

/// Config with the admin API enabled under [`ADMIN_KEY`].
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

/// Demo router plus the sink its logs land in.
pub fn test_app() -> (Router, MemorySink, Logger) {
    let (logger, sink) = test_logger(&[]);
    let router = build_router(&test_config(), &logger);
    (router, sink, logger)
}

/// Serve `router` on an ephemeral port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum::serve(listener, app).await;
    });
    addr
}

pub async fn body_string(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Response records only.
pub fn responses(sink: &MemorySink) -> Vec<LogRecord> {
    sink.records()
        .into_iter()
        .filter(|r| r.action() == Some("response"))
        .collect()
}
