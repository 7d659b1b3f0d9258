//! Byte-stream wrapper that mirrors traffic into an accumulator.
//!
//! # Responsibilities
//! - Deliver every byte to/from the wrapped stream unchanged
//! - Copy the bytes that actually moved into a private buffer
//! - Count every byte observed, independent of any capture limit
//!
//! # Design Decisions
//! - Only bytes the wrapped stream accepted or produced are recorded, so
//!   partial reads and writes stay partial and are never double counted
//! - Flush, seek and shutdown are forwarded without interception
//! - Dropping the wrapper releases the buffer only; wrap `&mut S` to keep
//!   ownership of the stream with the caller

use std::io::{self, BufRead, IoSlice, Read, Seek, SeekFrom, Write};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Bytes, BytesMut};
use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};

use super::render::ContentRenderer;

/// Accumulated bytes for one direction of an exchange.
#[derive(Debug, Default)]
pub struct CapturedBody {
    buffer: BytesMut,
    bytes_observed: u64,
    /// Maximum number of bytes kept in `buffer`. `None` means unbounded.
    limit: Option<u64>,
}

impl CapturedBody {
    /// Create an unbounded accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator that stops buffering after `limit` bytes.
    ///
    /// Bytes beyond the limit are still counted.
    pub fn with_limit(limit: Option<u64>) -> Self {
        Self {
            buffer: BytesMut::new(),
            bytes_observed: 0,
            limit,
        }
    }

    /// Record bytes that moved through the stream.
    pub fn record(&mut self, bytes: &[u8]) {
        self.bytes_observed += bytes.len() as u64;

        let room = match self.limit {
            Some(limit) => limit
                .saturating_sub(self.buffer.len() as u64)
                .min(bytes.len() as u64) as usize,
            None => bytes.len(),
        };
        if room > 0 {
            self.buffer.extend_from_slice(&bytes[..room]);
        }
    }

    /// Total bytes observed so far.
    pub fn bytes_observed(&self) -> u64 {
        self.bytes_observed
    }

    /// The buffered prefix of the observed bytes.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns true if some observed bytes were not buffered.
    pub fn is_truncated(&self) -> bool {
        self.bytes_observed > self.buffer.len() as u64
    }

    /// Render the buffered bytes as a log preview.
    pub fn render(&self, content_type: Option<&str>, renderer: &ContentRenderer) -> String {
        renderer.render(&self.buffer, self.bytes_observed, content_type)
    }

    /// Consume the accumulator, returning the buffered bytes.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

pin_project! {
    /// A stream wrapper that mirrors every byte read or written into a
    /// [`CapturedBody`].
    ///
    /// Implements the blocking `std::io` traits and the tokio async traits
    /// whenever the wrapped stream does.
    #[derive(Debug)]
    pub struct DualStream<S> {
        #[pin]
        inner: S,
        capture: CapturedBody,
    }
}

impl<S> DualStream<S> {
    /// Wrap a stream with an unbounded accumulator.
    pub fn new(inner: S) -> Self {
        Self::with_capture(inner, CapturedBody::new())
    }

    /// Wrap a stream with a pre-configured accumulator.
    pub fn with_capture(inner: S, capture: CapturedBody) -> Self {
        Self { inner, capture }
    }

    /// Total bytes that moved through the wrapper so far.
    pub fn bytes_observed(&self) -> u64 {
        self.capture.bytes_observed()
    }

    /// The accumulator.
    pub fn captured(&self) -> &CapturedBody {
        &self.capture
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutable access to the wrapped stream. I/O done through this
    /// reference bypasses the accumulator.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap, dropping the accumulator.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Unwrap into the wrapped stream and the accumulator.
    pub fn into_parts(self) -> (S, CapturedBody) {
        (self.inner, self.capture)
    }
}

impl<S: Read> Read for DualStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.capture.record(&buf[..n]);
        }
        Ok(n)
    }
}

impl<S: BufRead> BufRead for DualStream<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if amt == 0 {
            self.inner.consume(0);
            return;
        }

        // Bytes leave the stream here, not in fill_buf. A preceding fill_buf
        // already loaded them, so this call returns the buffered slice
        // without touching the underlying reader.
        match self.inner.fill_buf() {
            Ok(available) => self.capture.record(&available[..amt.min(available.len())]),
            Err(error) => debug_assert!(false, "consume without buffered data: {error}"),
        }
        self.inner.consume(amt);
    }
}

impl<S: Write> Write for DualStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.capture.record(&buf[..n]);
        Ok(n)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        let n = self.inner.write_vectored(bufs)?;
        record_vectored(&mut self.capture, bufs, n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Seek> Seek for DualStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<S: AsyncRead> AsyncRead for DualStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        let before = buf.filled().len();
        ready!(this.inner.poll_read(cx, buf))?;

        let filled = &buf.filled()[before..];
        if !filled.is_empty() {
            this.capture.record(filled);
        }
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncWrite> AsyncWrite for DualStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.project();
        let n = ready!(this.inner.poll_write(cx, buf))?;
        this.capture.record(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.project();
        let n = ready!(this.inner.poll_write_vectored(cx, bufs))?;
        record_vectored(this.capture, bufs, n);
        Poll::Ready(Ok(n))
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_shutdown(cx)
    }
}

impl<S: AsyncSeek> AsyncSeek for DualStream<S> {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        self.project().inner.start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        self.project().inner.poll_complete(cx)
    }
}

/// Record the first `written` bytes spread across `bufs`.
fn record_vectored(capture: &mut CapturedBody, bufs: &[IoSlice<'_>], mut written: usize) {
    for buf in bufs {
        if written == 0 {
            break;
        }
        let take = written.min(buf.len());
        capture.record(&buf[..take]);
        written -= take;
    }
}
