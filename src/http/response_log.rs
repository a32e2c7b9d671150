//! Request and response log bodies.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, MatchedPath};
use axum::http::{header, HeaderMap, Request};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::observability::record::LogAction;

/// Structured body of the `action=response` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseLog {
    pub action: LogAction,
    pub method: String,
    pub path: String,
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub ip: String,
    /// Milliseconds between request entry and the terminal body frame.
    pub duration: u64,
    pub status_code: u16,
    pub query: Map<String, Value>,
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    pub data: String,
}

/// Request attributes captured at entry, shared by both records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLog {
    pub action: LogAction,
    pub method: String,
    pub path: String,
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub ip: String,
    pub query: Map<String, Value>,
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
}

impl RequestLog {
    /// Read everything but the path params, which need the routing extractor.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let path = req.uri().path().to_string();
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| path.clone());
        let agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            action: LogAction::Request,
            method: req.method().as_str().to_uppercase(),
            path,
            route,
            agent,
            ip: client_ip(req),
            query: query_map(req.uri().query()),
            params: Map::new(),
            headers: None,
        }
    }

    pub fn into_response(
        self,
        status_code: u16,
        duration: u64,
        headers: Option<Map<String, Value>>,
        data: String,
    ) -> ResponseLog {
        ResponseLog {
            action: LogAction::Response,
            method: self.method,
            path: self.path,
            route: self.route,
            agent: self.agent,
            ip: self.ip,
            duration,
            status_code,
            query: self.query,
            params: self.params,
            headers,
            data,
        }
    }
}

/// Peer address when the server exposes it, otherwise the `Host` header.
fn client_ip<B>(req: &Request<B>) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| host.split(':').next().unwrap_or(host).to_string())
        .unwrap_or_default()
}

/// Decoded query string; repeated keys collect into an array.
pub fn query_map(query: Option<&str>) -> Map<String, Value> {
    let mut map = Map::new();
    let Some(query) = query else {
        return map;
    };
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        insert_multi(&mut map, key.into_owned(), Value::String(value.into_owned()));
    }
    map
}

/// Header map as JSON; non-UTF-8 values are rendered lossily.
pub fn headers_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        insert_multi(&mut map, name.as_str().to_string(), Value::String(value));
    }
    map
}

fn insert_multi(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}

/// Response body as text; bodies over `limit` bytes are summarized.
pub fn body_text(chunks: &[axum::body::Bytes], total: usize, limit: usize) -> String {
    if total > limit {
        return format!("[{total} bytes]");
    }
    let mut buf = Vec::with_capacity(total);
    for chunk in chunks {
        buf.extend_from_slice(chunk);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
