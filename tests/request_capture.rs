//! End-to-end request/response capture tests.

use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::routing;
use axum::Router;
use futures_util::future::join_all;
use futures_util::{stream, Stream};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use correlog::config::CaptureConfig;
use correlog::http::RequestLogLayer;
use correlog::observability::MemorySink;

mod common;

fn get(uri: &str, correlation_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(id) = correlation_id {
        builder = builder.header("correlationId", id);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_inbound_correlation_id_is_reused() {
    let (app, sink, _) = common::test_app();

    let res = app.oneshot(get("/hello", Some("abc-123"))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["correlationid"], "abc-123");
    assert_eq!(common::body_string(res).await, "Hello, world!");

    let responses = common::responses(&sink);
    assert_eq!(responses.len(), 1);
    let record = &responses[0];
    assert_eq!(record.correlation_id, "abc-123");
    assert_eq!(record.level, "INFO");
    assert_eq!(record.field("statusCode"), Some(&json!(200)));
    assert!(record.field("duration").and_then(Value::as_u64).is_some());
    assert_eq!(record.field("method"), Some(&json!("GET")));
    assert_eq!(record.field("path"), Some(&json!("/hello")));
    assert_eq!(record.field("route"), Some(&json!("/hello")));
    assert_eq!(record.field("data"), Some(&json!("Hello, world!")));

    // the handler's own log line carries the same id
    let handler = sink
        .records()
        .into_iter()
        .find(|r| r.class == "HelloController")
        .unwrap();
    assert_eq!(handler.correlation_id, "abc-123");
}

#[tokio::test]
async fn test_missing_correlation_id_is_generated() {
    let (app, sink, _) = common::test_app();

    let res = app.oneshot(get("/hello", None)).await.unwrap();
    let header = res.headers()["correlationid"].to_str().unwrap().to_string();
    common::body_string(res).await;

    let parsed = Uuid::parse_str(&header).unwrap();
    assert_eq!(parsed.get_version_num(), 4);

    let responses = common::responses(&sink);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].correlation_id, header);
}

#[tokio::test]
async fn test_route_params_and_method_trace() {
    let (app, sink, _) = common::test_app();

    let res = app
        .oneshot(get("/hello/ada?lang=en", Some("trace-1")))
        .await
        .unwrap();
    let body: Value = serde_json::from_str(&common::body_string(res).await).unwrap();
    assert_eq!(body["message"], json!("Hello, ada!"));

    let records = sink.with_correlation_id("trace-1");
    let trace = records
        .iter()
        .find(|r| r.action() == Some("method-trace"))
        .unwrap();
    assert_eq!(trace.message, "Called method: Greeter.greet");
    assert_eq!(trace.field("parameters"), Some(&json!(["ada"])));
    assert_eq!(trace.field("name"), Some(&json!("ada")));

    let response = records
        .iter()
        .find(|r| r.action() == Some("response"))
        .unwrap();
    assert_eq!(response.field("route"), Some(&json!("/hello/{name}")));
    assert_eq!(response.field("params"), Some(&json!({"name": "ada"})));
    assert_eq!(response.field("query"), Some(&json!({"lang": "en"})));
}

#[tokio::test]
async fn test_unmatched_route_is_captured() {
    let (app, sink, _) = common::test_app();
    let res = app.oneshot(get("/missing", Some("abc-404"))).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["correlationid"], "abc-404");
    common::body_string(res).await;

    let responses = common::responses(&sink);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].correlation_id, "abc-404");
    assert_eq!(responses[0].field("statusCode"), Some(&json!(404)));
    assert_eq!(responses[0].field("route"), Some(&json!("/missing")));
    assert_eq!(responses[0].field("params"), Some(&json!({})));
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_ids() {
    let (app, sink, _) = common::test_app();

    let calls = (0..25).map(|i| {
        let app = app.clone();
        async move {
            let id = format!("req-{i}");
            let res = app.oneshot(get("/hello", Some(&id))).await.unwrap();
            assert_eq!(res.headers()["correlationid"], id.as_str());
            common::body_string(res).await;
            id
        }
    });
    let ids = join_all(calls).await;

    for id in ids {
        let records = sink.with_correlation_id(&id);
        assert_eq!(records.len(), 2, "handler + response record for {id}");
        assert_eq!(
            records
                .iter()
                .filter(|r| r.action() == Some("response"))
                .count(),
            1
        );
    }
}

#[tokio::test]
async fn test_admin_update_applies_to_next_request() {
    let (app, sink, _) = common::test_app();

    let update = Request::builder()
        .method("PUT")
        .uri("/admin/hidden-fields")
        .header(header::AUTHORIZATION, format!("Bearer {}", common::ADMIN_KEY))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"fields":["content-type"]}"#))
        .unwrap();
    let res = app.clone().oneshot(update).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    common::body_string(res).await;
    sink.clear();

    let res = app.oneshot(get("/hello", Some("after"))).await.unwrap();
    common::body_string(res).await;

    let record = &common::responses(&sink)[0];
    assert_eq!(
        record.field("headers").and_then(|h| h.get("content-type")),
        Some(&json!("***REDACTED***"))
    );
    assert_eq!(
        record.field("headers").and_then(|h| h.get("correlationid")),
        Some(&json!("after"))
    );
}

#[tokio::test]
async fn test_wire_response_logged_before_client_sees_end() {
    let (app, sink, _) = common::test_app();
    let addr = common::spawn_server(app).await;

    let res = reqwest::Client::new()
        .get(format!("http://{addr}/hello"))
        .header("correlationId", "wire-1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["correlationid"], "wire-1");
    assert_eq!(res.text().await.unwrap(), "Hello, world!");

    let responses = common::responses(&sink);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].correlation_id, "wire-1");
    assert_eq!(responses[0].field("ip"), Some(&json!("127.0.0.1")));
}

fn halves() -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    stream::iter(["he", "llo"].map(|p| Ok(Bytes::from_static(p.as_bytes()))))
}

/// Routes streaming "hello" in two chunks, with and without a declared length.
fn streaming_app() -> (Router, MemorySink) {
    let (logger, sink) = common::test_logger(&[]);
    let router = Router::new()
        .route("/chunked", routing::get(|| async { Body::from_stream(halves()) }))
        .route(
            "/sized",
            routing::get(|| async { ([(header::CONTENT_LENGTH, "5")], Body::from_stream(halves())) }),
        )
        .layer(RequestLogLayer::new(&logger, &CaptureConfig::default()));
    (router, sink)
}

async fn fetch_streamed(path: &str, correlation_id: &str) -> MemorySink {
    let (app, sink) = streaming_app();
    let addr = common::spawn_server(app).await;

    let res = reqwest::Client::new()
        .get(format!("http://{addr}{path}"))
        .header("correlationId", correlation_id)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["correlationid"], correlation_id);
    assert_eq!(res.text().await.unwrap(), "hello");
    sink
}

#[tokio::test]
async fn test_wire_chunked_stream_logged_once() {
    let sink = fetch_streamed("/chunked", "wire-chunked").await;

    let responses = common::responses(&sink);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].correlation_id, "wire-chunked");
    assert_eq!(responses[0].field("data"), Some(&json!("hello")));
}

#[tokio::test]
async fn test_wire_sized_stream_logged_once() {
    let sink = fetch_streamed("/sized", "wire-sized").await;

    let responses = common::responses(&sink);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].correlation_id, "wire-sized");
    assert_eq!(responses[0].field("data"), Some(&json!("hello")));
    assert_eq!(responses[0].field("route"), Some(&json!("/sized")));
}
