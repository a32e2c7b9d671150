//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the demo handlers and the admin API
//! - Wire up middleware (request capture, timeout, tracing)
//! - Serve with graceful shutdown
//! - Apply hot-reloaded logging settings to the live logger configuration

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::schema::AppConfig;
use crate::context::CorrelationContext;
use crate::http::middleware::{record_route, CorrelationId, RequestLogLayer};
use crate::observability::{LogArg, Logger, MethodTracer};
use crate::{log_debug, log_info};

/// State injected into the demo handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub logger: Logger,
    pub greeter: MethodTracer,
}

impl AppState {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.for_component("HelloController"),
            greeter: MethodTracer::new(logger, "Greeter"),
        }
    }
}

/// HTTP server exposing the demo routes with request capture.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &AppConfig, logger: &Logger) -> Self {
        Self {
            router: build_router(config, logger),
        }
    }

    /// Run until Ctrl+C, accepting connections on `listener`.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router with all middleware layers.
///
/// Request capture wraps everything, including the fallback and timeout
/// responses. `record_route` runs per route to hand the matched route pattern
/// and path params to the response record.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, logger: &Logger) -> Router {
    let mut router = Router::new()
        .route("/hello", get(hello))
        .route("/hello/{name}", get(hello_name))
        .with_state(AppState::new(logger));

    if config.admin.enabled {
        let admin = AdminState::new(logger.config().clone(), &config.admin.api_key);
        router = router.merge(setup_admin_router(admin));
    }

    router
        .route_layer(middleware::from_fn(record_route))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(RequestLogLayer::new(logger, &config.capture))
        .layer(TraceLayer::new_for_http())
}

/// Apply reloaded configurations to the live logger settings.
pub fn spawn_config_reloader(logger: Logger, mut updates: mpsc::UnboundedReceiver<AppConfig>) {
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            logger.config().apply(&config.logging);
            tracing::info!(
                hidden_fields = config.logging.hidden_fields.len(),
                level = %config.logging.level,
                "Logging configuration reloaded"
            );
        }
    });
}

async fn hello(State(state): State<AppState>, correlation_id: CorrelationId) -> &'static str {
    log_info!(state.logger, "Saying hello to", correlation_id.as_str());
    "Hello, world!"
}

async fn hello_name(State(state): State<AppState>, Path(name): Path<String>) -> Json<Value> {
    CorrelationContext::set_log_info_data("name", name.clone());
    log_debug!(state.logger, "Greeting", LogArg::field("length", name.len()));

    let greeting = state.greeter.trace("greet", vec![json!(name)], || {
        format!("Hello, {name}!")
    });
    Json(json!({ "message": greeting }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
