//! Tower layer that captures one log entry per HTTP exchange.
//!
//! # Data Flow
//! ```text
//! request
//!     → CaptureService::call (assign CorrelationId, wrap request body)
//!     → inner service (reads/writes through CaptureBody)
//!     → ResponseFuture (insert tracking header, snapshot status + headers,
//!       wrap response body)
//!     → response body streams to the client
//!     → end of body / drop: PendingExchange::finish builds the LogEntry
//!     → sink
//! ```
//!
//! # Design Decisions
//! - The only state shared between exchanges is the immutable config
//! - Handler errors propagate unchanged and never reach the sink
//! - Each direction buffers at most its render budget; counts stay exact

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body::Body;
use hyper::ext::ReasonPhrase;
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use super::body::{BodyTap, CaptureBody};
use super::entry::{CorrelationId, LogEntry};
use super::render::ContentRenderer;
use super::sink::Sink;
use crate::error::CaptureError;
use crate::observability::metrics;

/// Default name of the response header carrying the correlation id.
pub const DEFAULT_TRACKING_HEADER: &str = "http-tracking-id";

/// User-facing capture settings.
#[derive(Clone, Default)]
pub struct CaptureOptions {
    /// Response header carrying the correlation id. Empty or `None` selects
    /// [`DEFAULT_TRACKING_HEADER`].
    pub tracking_header_name: Option<String>,

    /// Maximum request body bytes rendered into the entry. `None` is unbounded.
    pub max_request_body_bytes: Option<u64>,

    /// Maximum response body bytes rendered into the entry. `None` is unbounded.
    pub max_response_body_bytes: Option<u64>,

    /// Consumer of finished entries. `None` disables dispatch.
    pub sink: Option<Sink>,
}

impl CaptureOptions {
    /// Set the consumer of finished entries.
    pub fn with_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(LogEntry) + Send + Sync + 'static,
    {
        self.sink = Some(Arc::new(sink));
        self
    }
}

impl fmt::Debug for CaptureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureOptions")
            .field("tracking_header_name", &self.tracking_header_name)
            .field("max_request_body_bytes", &self.max_request_body_bytes)
            .field("max_response_body_bytes", &self.max_response_body_bytes)
            .field("sink", &self.sink.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Validated, immutable configuration shared by every exchange.
struct CaptureConfig {
    tracking_header: HeaderName,
    max_request_body_bytes: Option<u64>,
    max_response_body_bytes: Option<u64>,
    sink: Option<Sink>,
}

impl CaptureConfig {
    fn from_options(options: CaptureOptions) -> Result<Self, CaptureError> {
        let name = options
            .tracking_header_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_TRACKING_HEADER.to_string());

        let tracking_header = HeaderName::try_from(name.as_str())
            .map_err(|source| CaptureError::InvalidHeaderName { name, source })?;

        Ok(Self {
            tracking_header,
            max_request_body_bytes: options.max_request_body_bytes,
            max_response_body_bytes: options.max_response_body_bytes,
            sink: options.sink,
        })
    }
}

/// Layer that wraps services with [`CaptureService`].
#[derive(Clone)]
pub struct CaptureLayer {
    config: Arc<CaptureConfig>,
}

impl CaptureLayer {
    /// Validate `options` and build the layer.
    pub fn new(options: CaptureOptions) -> Result<Self, CaptureError> {
        let config = CaptureConfig::from_options(options)?;
        tracing::debug!(
            tracking_header = %config.tracking_header,
            max_request_body_bytes = ?config.max_request_body_bytes,
            max_response_body_bytes = ?config.max_response_body_bytes,
            sink = config.sink.is_some(),
            "Capture layer configured"
        );
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Name of the header carrying the correlation id.
    pub fn tracking_header(&self) -> &HeaderName {
        &self.config.tracking_header
    }
}

impl<S> Layer<S> for CaptureLayer {
    type Service = CaptureService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CaptureService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Service that captures traffic of the wrapped service.
#[derive(Clone)]
pub struct CaptureService<S> {
    inner: S,
    config: Arc<CaptureConfig>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CaptureService<S>
where
    S: Service<Request<CaptureBody<ReqBody>>, Response = Response<ResBody>>,
    ReqBody: Body<Data = Bytes>,
    ResBody: Body<Data = Bytes>,
{
    type Response = Response<CaptureBody<ResBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let id = CorrelationId::new();
        let started = Instant::now();

        let (mut parts, body) = request.into_parts();
        parts.extensions.insert(id);

        let request_tap = BodyTap::new(self.config.max_request_body_bytes);
        let body = CaptureBody::new(body, request_tap.clone());

        tracing::trace!(
            correlation_id = %id,
            method = %parts.method,
            uri = %parts.uri,
            "Exchange streams wrapped"
        );

        let exchange = ExchangeStart {
            config: Arc::clone(&self.config),
            id,
            started,
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            request_headers: parts.headers.clone(),
            request_tap,
        };

        ResponseFuture {
            inner: self.inner.call(Request::from_parts(parts, body)),
            exchange: Some(exchange),
        }
    }
}

pin_project! {
    /// Response future for [`CaptureService`].
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        exchange: Option<ExchangeStart>,
    }
}

impl<F, ResBody, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
    ResBody: Body<Data = Bytes>,
{
    type Output = Result<Response<CaptureBody<ResBody>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));
        let exchange = this
            .exchange
            .take()
            .expect("ResponseFuture polled after completion");

        match result {
            Ok(response) => Poll::Ready(Ok(exchange.respond(response))),
            Err(err) => {
                exchange.fault();
                Poll::Ready(Err(err))
            }
        }
    }
}

/// Request-side state captured when the exchange starts.
struct ExchangeStart {
    config: Arc<CaptureConfig>,
    id: CorrelationId,
    started: Instant,
    method: Method,
    uri: Uri,
    request_headers: HeaderMap,
    request_tap: BodyTap,
}

impl ExchangeStart {
    /// Attach the tracking header and wrap the response body.
    fn respond<B>(self, response: Response<B>) -> Response<CaptureBody<B>>
    where
        B: Body<Data = Bytes>,
    {
        let (mut parts, body) = response.into_parts();
        parts
            .headers
            .insert(self.config.tracking_header.clone(), self.id.header_value());

        let bodiless = self.method == Method::HEAD
            || parts.status.is_informational()
            || parts.status == StatusCode::NO_CONTENT
            || parts.status == StatusCode::NOT_MODIFIED;

        let reason = parts
            .extensions
            .get::<ReasonPhrase>()
            .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
            .or_else(|| parts.status.canonical_reason())
            .map(str::to_owned);

        let response_tap = BodyTap::new(self.config.max_response_body_bytes);
        let pending = PendingExchange {
            status: parts.status,
            reason,
            response_headers: parts.headers.clone(),
            response_tap: response_tap.clone(),
            start: self,
        };

        Response::from_parts(
            parts,
            CaptureBody::with_exchange(body, response_tap, pending, bodiless),
        )
    }

    /// The handler failed; nothing reaches the sink.
    fn fault(self) {
        metrics::record_handler_fault();
        tracing::warn!(
            correlation_id = %self.id,
            method = %self.method,
            uri = %self.uri,
            request_length = self.request_tap.bytes_observed(),
            "Handler failed, no log entry emitted"
        );
    }
}

/// An exchange whose response is streaming to the client.
pub(crate) struct PendingExchange {
    start: ExchangeStart,
    status: StatusCode,
    reason: Option<String>,
    response_headers: HeaderMap,
    response_tap: BodyTap,
}

impl PendingExchange {
    /// Build the log entry and hand it to the sink.
    pub(crate) fn finish(self, completed: bool) {
        let start = self.start;
        let config = &start.config;
        let request_length = start.request_tap.bytes_observed();
        let response_length = self.response_tap.bytes_observed();

        metrics::record_exchange(
            &start.method,
            self.status,
            completed,
            request_length,
            response_length,
        );

        let Some(sink) = config.sink.as_ref() else {
            return;
        };

        let request_body = declared_content_type(&start.request_headers).map(|content_type| {
            start.request_tap.render(
                Some(content_type),
                &ContentRenderer::new(config.max_request_body_bytes),
            )
        });
        let response_body = declared_content_type(&self.response_headers).map(|content_type| {
            self.response_tap.render(
                Some(content_type),
                &ContentRenderer::new(config.max_response_body_bytes),
            )
        });

        let entry = LogEntry {
            id: start.id,
            method: start.method,
            uri: start.uri,
            request_headers: start.request_headers,
            request_body,
            request_length,
            status: self.status,
            reason: self.reason,
            response_headers: self.response_headers,
            response_body,
            response_length,
            completed,
            elapsed: start.started.elapsed(),
        };

        tracing::debug!(
            correlation_id = %entry.id,
            status = entry.status.as_u16(),
            completed,
            "Dispatching log entry"
        );
        sink(entry);
    }
}

/// The first `Content-Type` value; unreadable values count as empty.
fn declared_content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CONTENT_TYPE)
        .map(|value| value.to_str().unwrap_or_default())
}
