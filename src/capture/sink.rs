//! Consumers of finished log entries.
//!
//! A sink is a plain function value. It runs synchronously on the task that
//! finished the response body, so it should not block for long.

use std::fmt::Write as _;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::entry::LogEntry;

/// Callback invoked once per completed exchange.
pub type Sink = Arc<dyn Fn(LogEntry) + Send + Sync>;

/// Emit each entry as a structured `tracing` event.
pub fn tracing_sink() -> Sink {
    Arc::new(|entry: LogEntry| {
        tracing::info!(
            target: "traffic_capture::exchange",
            correlation_id = %entry.id,
            method = %entry.method,
            uri = %entry.uri,
            request_headers = ?entry.request_headers,
            request_body = entry.request_body.as_deref().unwrap_or_default(),
            request_length = entry.request_length,
            status = entry.status.as_u16(),
            reason = entry.reason.as_deref().unwrap_or_default(),
            response_headers = ?entry.response_headers,
            response_body = entry.response_body.as_deref().unwrap_or_default(),
            response_length = entry.response_length,
            completed = entry.completed,
            elapsed_ms = entry.elapsed.as_millis() as u64,
            "HTTP exchange"
        );
    })
}

/// Print each entry to stdout as a human-readable block.
pub fn console_sink() -> Sink {
    Arc::new(|entry: LogEntry| {
        println!("{}", format_console(&entry));
    })
}

/// Forward entries to a channel. Entries are dropped once the receiver is gone.
pub fn channel_sink(tx: mpsc::UnboundedSender<LogEntry>) -> Sink {
    Arc::new(move |entry: LogEntry| {
        if tx.send(entry).is_err() {
            tracing::trace!("Log entry receiver dropped");
        }
    })
}

/// Render an entry in the console block format.
pub fn format_console(entry: &LogEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nTracking Id: {}", entry.id);
    let _ = writeln!(out, "REQUEST");
    let _ = writeln!(out, "Verb: {}", entry.method);
    let _ = writeln!(out, "RequestUri: {}", entry.uri);
    let _ = writeln!(out, "Request: {}", entry.request_body.as_deref().unwrap_or_default());
    let _ = writeln!(out, "RequestLength: {}", entry.request_length);
    let _ = writeln!(out, "\nRESPONSE");
    let _ = writeln!(out, "StatusCode: {}", entry.status.as_u16());
    let _ = writeln!(out, "ReasonPhrase: {}", entry.reason.as_deref().unwrap_or_default());
    let _ = writeln!(out, "Response: {}", entry.response_body.as_deref().unwrap_or_default());
    let _ = write!(out, "Content-Length: {}", entry.response_length);
    if !entry.completed {
        let _ = write!(out, "\n(incomplete: response body ended early)");
    }
    out
}
