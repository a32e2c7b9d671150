use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenFieldsResponse {
    pub hidden_fields: Vec<String>,
}

/// Request body for PUT and POST. A missing `fields` is an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HiddenFieldsUpdate {
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

fn snapshot(state: &AdminState) -> Json<HiddenFieldsResponse> {
    Json(HiddenFieldsResponse {
        hidden_fields: state.logger_config.hidden_fields().as_slice().to_vec(),
    })
}

pub async fn get_hidden_fields(State(state): State<AdminState>) -> Json<HiddenFieldsResponse> {
    snapshot(&state)
}

pub async fn replace_hidden_fields(
    State(state): State<AdminState>,
    Json(update): Json<HiddenFieldsUpdate>,
) -> Json<HiddenFieldsResponse> {
    state
        .logger_config
        .set_hidden_fields(update.fields.unwrap_or_default());
    tracing::info!("Hidden fields replaced");
    snapshot(&state)
}

pub async fn append_hidden_fields(
    State(state): State<AdminState>,
    Json(update): Json<HiddenFieldsUpdate>,
) -> Json<HiddenFieldsResponse> {
    state.logger_config.add_hidden_fields(update.fields);
    tracing::info!("Hidden fields appended");
    snapshot(&state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::setup_admin_router;
    use crate::config::schema::LoggingConfig;
    use crate::context::redaction::LoggerConfig;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state() -> AdminState {
        let config = Arc::new(LoggerConfig::with_env(
            LoggingConfig::default(),
            Arc::new(HashMap::<String, String>::new()),
        ));
        AdminState::new(config, "secret")
    }

    fn request(method: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri("/admin/hidden-fields")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn fields(res: axum::response::Response) -> Vec<String> {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice::<HiddenFieldsResponse>(&bytes)
            .unwrap()
            .hidden_fields
    }

    #[tokio::test]
    async fn test_requires_token() {
        let app = setup_admin_router(state());
        let res = app.oneshot(request("GET", None, "")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let app = setup_admin_router(state());
        let res = app.oneshot(request("GET", Some("wrong"), "")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_only_guards_admin_routes() {
        let app = setup_admin_router(state());
        let req = Request::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_then_post() {
        let state = state();
        let app = setup_admin_router(state.clone());

        let res = app
            .clone()
            .oneshot(request("PUT", Some("secret"), r#"{"fields":["Password"]}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(fields(res).await, ["password"]);

        let res = app
            .clone()
            .oneshot(request("POST", Some("secret"), r#"{"fields":["token","password"]}"#))
            .await
            .unwrap();
        assert_eq!(fields(res).await, ["password", "token"]);

        let res = app
            .oneshot(request("POST", Some("secret"), "{}"))
            .await
            .unwrap();
        assert_eq!(fields(res).await, ["password", "token"]);
        assert!(state.logger_config.is_hidden("TOKEN"));
    }
}
