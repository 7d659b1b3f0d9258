//! Traffic capture subsystem.
//!
//! # Data Flow
//! ```text
//! bytes on the wire
//!     → dual_stream.rs / body.rs (mirror into CapturedBody, count)
//!     → layer.rs (one exchange per request, tracking header)
//!     → render.rs (text or "<type> [N bytes]" preview)
//!     → entry.rs (LogEntry)
//!     → sink.rs (caller-supplied callback)
//! ```
//!
//! # Design Decisions
//! - Wrappers are transparent: chunking, suspension and end-of-stream of
//!   the wrapped stream are preserved
//! - Captured bytes never flow back into the traffic
//! - Rendering happens once, after the exchange, from the accumulators

pub mod body;
pub mod dual_stream;
pub mod entry;
pub mod layer;
pub mod render;
pub mod sink;

pub use body::{BodyTap, CaptureBody};
pub use dual_stream::{CapturedBody, DualStream};
pub use entry::{CorrelationId, LogEntry};
pub use layer::{CaptureLayer, CaptureOptions, CaptureService, DEFAULT_TRACKING_HEADER};
pub use render::ContentRenderer;
pub use sink::{channel_sink, console_sink, tracing_sink, Sink};
