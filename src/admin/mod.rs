//! Administrative HTTP API.
//!
//! # Routes
//! ```text
//! GET  /admin/hidden-fields   current redaction list
//! PUT  /admin/hidden-fields   replace the list
//! POST /admin/hidden-fields   append to the list
//! ```
//! Every route requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::context::redaction::LoggerConfig;
use self::auth::admin_auth_middleware;
use self::handlers::{append_hidden_fields, get_hidden_fields, replace_hidden_fields};

/// Shared state of the admin routes.
#[derive(Debug, Clone)]
pub struct AdminState {
    pub logger_config: Arc<LoggerConfig>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(logger_config: Arc<LoggerConfig>, api_key: &str) -> Self {
        Self {
            logger_config,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route(
            "/admin/hidden-fields",
            get(get_hidden_fields)
                .put(replace_hidden_fields)
                .post(append_hidden_fields),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
