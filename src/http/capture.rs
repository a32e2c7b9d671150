//! Response body capture.
//!
//! [`CaptureBody`] sits between the handler's body and the connection. Every
//! frame passes through unchanged; data frames are also retained so the
//! response record can carry the full body however it was written.
//!
//! The response record is emitted before the terminal frame is handed back
//! to the server, so the log line always precedes the client seeing the end
//! of the response. For a body whose length is known up front (exact size hint
//! or a `Content-Length` header) the frame carrying the last byte is terminal.
//! A body that errors out or is dropped early emits nothing.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use serde_json::{Map, Value};

use crate::context::store::{enter_scope, ContextNamespace, ContextScope};
use crate::http::middleware::{MATCHED_ROUTE_KEY, PATH_PARAMS_KEY};
use crate::http::response_log::{body_text, RequestLog};
use crate::observability::logger::Logger;
use crate::observability::record::LogArg;

/// Everything needed to emit the response record once the body completes.
pub(crate) struct PendingResponseLog {
    logger: Logger,
    scope: Arc<ContextScope>,
    request: RequestLog,
    status_code: u16,
    headers: Option<Map<String, Value>>,
    started: Instant,
    max_body_bytes: usize,
    chunks: Vec<Bytes>,
    retained: usize,
    seen: u64,
}

impl PendingResponseLog {
    pub fn new(
        logger: Logger,
        scope: Arc<ContextScope>,
        request: RequestLog,
        status_code: u16,
        headers: Option<Map<String, Value>>,
        started: Instant,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            logger,
            scope,
            request,
            status_code,
            headers,
            started,
            max_body_bytes,
            chunks: Vec::new(),
            retained: 0,
            seen: 0,
        }
    }

    fn record(&mut self, data: &Bytes) {
        self.seen += data.len() as u64;
        // chunks past the limit are counted, not kept
        if self.retained + data.len() <= self.max_body_bytes {
            self.retained += data.len();
            self.chunks.push(data.clone());
        }
    }

    fn emit(self) {
        let total = usize::try_from(self.seen).unwrap_or(usize::MAX);
        let data = body_text(&self.chunks, total, self.max_body_bytes);
        let duration = self.started.elapsed().as_millis() as u64;
        let mut request = self.request;
        let ns = ContextNamespace::Logger;
        if let Some(Value::String(route)) = self.scope.get(ns, MATCHED_ROUTE_KEY) {
            request.route = route;
        }
        if let Some(Value::Object(params)) = self.scope.get(ns, PATH_PARAMS_KEY) {
            request.params = params;
        }
        let log = request.into_response(self.status_code, duration, self.headers, data);
        let logger = self.logger;
        enter_scope(self.scope, || logger.info(vec![LogArg::object(&log)]));
    }
}

/// Response body wrapper that retains data frames for the response record.
pub struct CaptureBody {
    inner: Body,
    pending: Option<PendingResponseLog>,
    expected_len: Option<u64>,
}

impl CaptureBody {
    /// Wrap `inner`. `declared_len` is the response's `Content-Length`, if any.
    /// A body that is already complete emits its record now.
    pub(crate) fn new(
        inner: Body,
        pending: PendingResponseLog,
        declared_len: Option<u64>,
    ) -> Self {
        let mut body = Self {
            expected_len: inner.size_hint().exact().or(declared_len),
            inner,
            pending: Some(pending),
        };
        if body.inner.is_end_stream() {
            body.finish();
        }
        body
    }

    /// Whether the response record has been emitted (or abandoned).
    pub fn is_finished(&self) -> bool {
        self.pending.is_none()
    }

    fn all_bytes_seen(&self) -> bool {
        match (&self.pending, self.expected_len) {
            (Some(pending), Some(expected)) => pending.seen >= expected,
            _ => false,
        }
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.emit();
        }
    }
}

impl HttpBody for CaptureBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some(pending)) = (frame.data_ref(), this.pending.as_mut()) {
                    pending.record(data);
                }
                if frame.is_trailers() || this.inner.is_end_stream() || this.all_bytes_seen() {
                    this.finish();
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.pending = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CaptureBody {
    fn drop(&mut self) {
        // The server may stop polling once a sized body is fully written.
        if self.pending.is_some() && (self.all_bytes_seen() || self.inner.is_end_stream()) {
            self.finish();
        }
    }
}
