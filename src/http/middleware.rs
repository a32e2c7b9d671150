//! Request/response capture middleware.
//!
//! # Responsibilities
//! - Open a context scope for every request
//! - Correlate: reuse the inbound correlation header or generate a UUID v4,
//!   write it back onto the request and into the scope
//! - Optionally log the incoming request (DEBUG, `action=request`)
//! - Set the correlation header on the response
//! - Wrap the response body so the `action=response` record is emitted when
//!   the body completes
//!
//! # Design Decisions
//! - Header names are case-insensitive; the configured name is normalized once
//! - Failing to set the response header is logged at WARN, never fatal
//! - The layer wraps the whole router so unmatched and timed-out requests are
//!   captured too; [`record_route`] runs as a route layer and leaves the matched
//!   route and path params in the scope for the response record
//! - The request record is emitted before routing and carries the raw path

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequestParts, MatchedPath, RawPathParams};
use axum::http::{header, HeaderName, HeaderValue, Request, Response};
use axum::middleware::Next;
use hyper::body::Body as HttpBody;
use serde_json::{Map, Value};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::config::schema::CaptureConfig;
use crate::context::store::{self, within_scope, ContextNamespace, ContextScope};
use crate::context::CorrelationContext;
use crate::http::capture::{CaptureBody, PendingResponseLog};
use crate::http::response_log::{headers_map, RequestLog};
use crate::observability::logger::Logger;
use crate::observability::record::LogArg;

/// Header used when the configured name is not a valid header name.
pub const DEFAULT_CORRELATION_HEADER: &str = "correlationid";

/// Component name on records emitted by the middleware.
const COMPONENT: &str = "RequestLogging";

/// Scope key holding the matched route pattern.
pub(crate) const MATCHED_ROUTE_KEY: &str = "matchedRoute";

/// Scope key holding the raw path params object.
pub(crate) const PATH_PARAMS_KEY: &str = "pathParams";

/// Correlation id of the current request, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CorrelationId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CorrelationId>()
            .cloned()
            .or_else(|| CorrelationContext::correlation_id().map(CorrelationId))
            .unwrap_or_else(|| CorrelationId(Uuid::new_v4().to_string())))
    }
}

#[derive(Debug)]
struct CaptureSettings {
    header: HeaderName,
    log_requests: bool,
    include_headers: bool,
    max_body_bytes: usize,
}

impl CaptureSettings {
    fn from_config(config: &CaptureConfig) -> Self {
        let header = HeaderName::try_from(config.correlation_header.as_str()).unwrap_or_else(|e| {
            tracing::warn!(
                header = %config.correlation_header,
                error = %e,
                "Invalid correlation header name, using default"
            );
            HeaderName::from_static(DEFAULT_CORRELATION_HEADER)
        });
        Self {
            header,
            log_requests: config.log_requests,
            include_headers: config.include_headers,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Layer installing [`RequestLogService`].
#[derive(Debug, Clone)]
pub struct RequestLogLayer {
    logger: Logger,
    settings: Arc<CaptureSettings>,
}

impl RequestLogLayer {
    pub fn new(logger: &Logger, config: &CaptureConfig) -> Self {
        Self {
            logger: logger.for_component(COMPONENT),
            settings: Arc::new(CaptureSettings::from_config(config)),
        }
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            logger: self.logger.clone(),
            settings: self.settings.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestLogService<S> {
    inner: S,
    logger: Logger,
    settings: Arc<CaptureSettings>,
}

impl<S, ResBody> Service<Request<Body>> for RequestLogService<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ResBody: HttpBody<Data = axum::body::Bytes> + Send + 'static,
    ResBody::Error: Into<axum::BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // take the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let logger = self.logger.clone();
        let settings = self.settings.clone();
        let scope = ContextScope::seeded(ContextNamespace::Logger);

        Box::pin(within_scope(scope.clone(), async move {
            let started = Instant::now();
            let (req, correlation_id) = correlate(req, &settings.header);
            let mut request_log = RequestLog::from_request(&req);

            if settings.include_headers {
                request_log.headers = Some(redacted_headers(&logger, req.headers()));
            }
            if settings.log_requests {
                logger.debug(vec![LogArg::object(&request_log)]);
            }
            request_log.headers = None;

            let response = inner.call(req).await?;
            let (mut parts, body) = response.into_parts();

            // both sources yield valid header values; the WARN arm is a guard
            match HeaderValue::from_str(&correlation_id) {
                Ok(value) => {
                    parts.headers.insert(settings.header.clone(), value);
                }
                Err(e) => logger.warn(vec![
                    LogArg::from("Failed to set correlation header on response"),
                    LogArg::error(&e),
                ]),
            }

            let headers = settings
                .include_headers
                .then(|| redacted_headers(&logger, &parts.headers));
            let declared_len = parts
                .headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let pending = PendingResponseLog::new(
                logger,
                scope,
                request_log,
                parts.status.as_u16(),
                headers,
                started,
                settings.max_body_bytes,
            );
            let body = CaptureBody::new(Body::new(body), pending, declared_len);
            Ok(Response::from_parts(parts, Body::new(body)))
        }))
    }
}

/// Resolve the request's correlation id and record it everywhere it is read.
fn correlate(mut req: Request<Body>, header: &HeaderName) -> (Request<Body>, String) {
    let inbound = req
        .headers()
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let correlation_id = match inbound {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                req.headers_mut().insert(header.clone(), value);
            }
            id
        }
    };

    CorrelationContext::set_correlation_id(correlation_id.clone());
    req.extensions_mut()
        .insert(CorrelationId(correlation_id.clone()));
    (req, correlation_id)
}

/// Route-layer middleware recording the matched route and path params into
/// the request's scope.
pub async fn record_route(req: Request<Body>, next: Next) -> Response<Body> {
    let (mut parts, body) = req.into_parts();
    if let Some(route) = parts.extensions.get::<MatchedPath>() {
        store::set_value(ContextNamespace::Logger, MATCHED_ROUTE_KEY, route.as_str());
    }
    if let Ok(params) = RawPathParams::from_request_parts(&mut parts, &()).await {
        let params: Map<String, Value> = params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        store::set_value(ContextNamespace::Logger, PATH_PARAMS_KEY, params);
    }
    next.run(Request::from_parts(parts, body)).await
}

fn redacted_headers(logger: &Logger, headers: &axum::http::HeaderMap) -> Map<String, Value> {
    let map = headers_map(headers);
    let config = logger.config();
    if config.runtime().show_sensitive {
        map
    } else {
        config.hidden_fields().redact(&map)
    }
}
