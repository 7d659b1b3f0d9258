//! HTTP body wrapper that mirrors data frames into a shared tap.
//!
//! # Responsibilities
//! - Forward every frame of the wrapped body unchanged (data, trailers, errors)
//! - Record data frames into a per-exchange [`BodyTap`]
//! - On the response side, finish the exchange once the body ends or is dropped
//!
//! # Design Decisions
//! - Frames are inspected by reference and moved on; no extra copies beyond
//!   the tap's own buffer
//! - Size hints and end-of-stream are forwarded so framing is unaffected

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

use super::dual_stream::CapturedBody;
use super::layer::PendingExchange;
use super::render::ContentRenderer;

/// Shared handle on one direction's captured bytes.
///
/// The body wrapper writes through it while the exchange reads it back
/// when building the log entry.
#[derive(Debug, Clone, Default)]
pub struct BodyTap(Arc<Mutex<CapturedBody>>);

impl BodyTap {
    /// Create a tap that buffers at most `limit` bytes.
    pub fn new(limit: Option<u64>) -> Self {
        Self(Arc::new(Mutex::new(CapturedBody::with_limit(limit))))
    }

    fn lock(&self) -> MutexGuard<'_, CapturedBody> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, bytes: &[u8]) {
        self.lock().record(bytes);
    }

    /// Total bytes observed so far.
    pub fn bytes_observed(&self) -> u64 {
        self.lock().bytes_observed()
    }

    /// Render the captured bytes as a log preview.
    pub fn render(&self, content_type: Option<&str>, renderer: &ContentRenderer) -> String {
        self.lock().render(content_type, renderer)
    }
}

pin_project! {
    /// Body wrapper installed on both directions of a captured exchange.
    pub struct CaptureBody<B> {
        #[pin]
        inner: B,
        tap: BodyTap,
        exchange: Option<PendingExchange>,
        ended: bool,
    }

    impl<B> PinnedDrop for CaptureBody<B> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            // hyper never polls a body that already reports its end, so an
            // ended body dropped here still counts as completed.
            finish(this.exchange, *this.ended);
        }
    }
}

impl<B> CaptureBody<B> {
    /// Wrap a body, recording its data frames into `tap`.
    pub fn new(inner: B, tap: BodyTap) -> Self {
        Self {
            inner,
            tap,
            exchange: None,
            ended: false,
        }
    }

    /// The tap this body records into.
    pub fn tap(&self) -> &BodyTap {
        &self.tap
    }
}

impl<B: Body> CaptureBody<B> {
    /// Wrap a response body that finishes `exchange` when it ends.
    ///
    /// `bodiless` marks a response that carries no body on the wire (HEAD,
    /// 1xx, 204, 304); dropping it unpolled still counts as completed.
    pub(crate) fn with_exchange(
        inner: B,
        tap: BodyTap,
        exchange: PendingExchange,
        bodiless: bool,
    ) -> Self {
        let ended = bodiless || inner.is_end_stream();
        Self {
            inner,
            tap,
            exchange: Some(exchange),
            ended,
        }
    }
}

impl<B: fmt::Debug> fmt::Debug for CaptureBody<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureBody")
            .field("inner", &self.inner)
            .field("tap", &self.tap)
            .field("pending_exchange", &self.exchange.is_some())
            .finish()
    }
}

fn finish(exchange: &mut Option<PendingExchange>, completed: bool) {
    if let Some(exchange) = exchange.take() {
        exchange.finish(completed);
    }
}

impl<B> Body for CaptureBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        match ready!(this.inner.as_mut().poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.tap.record(data);
                }
                if this.inner.is_end_stream() {
                    *this.ended = true;
                    finish(this.exchange, true);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(err)) => {
                finish(this.exchange, false);
                Poll::Ready(Some(Err(err)))
            }
            None => {
                *this.ended = true;
                finish(this.exchange, true);
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
