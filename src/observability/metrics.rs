//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define capture metrics (exchanges, body sizes, handler faults)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `capture_exchanges_total` (counter): finished exchanges by method, status, completed
//! - `capture_body_bytes` (histogram): observed body bytes by direction
//! - `capture_handler_faults_total` (counter): handler errors, no entry emitted
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels for method, status code and completion

use std::net::SocketAddr;

use http::{Method, StatusCode};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const EXCHANGES_TOTAL: &str = "capture_exchanges_total";
pub const BODY_BYTES: &str = "capture_body_bytes";
pub const HANDLER_FAULTS_TOTAL: &str = "capture_handler_faults_total";

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe();
    tracing::info!(%addr, "Metrics endpoint listening");
    Ok(())
}

fn describe() {
    ::metrics::describe_counter!(EXCHANGES_TOTAL, "Finished exchanges handed to the log sink");
    ::metrics::describe_histogram!(
        BODY_BYTES,
        ::metrics::Unit::Bytes,
        "Body bytes observed per exchange"
    );
    ::metrics::describe_counter!(
        HANDLER_FAULTS_TOTAL,
        "Handler errors that produced no log entry"
    );
}

/// Record one finished exchange.
pub fn record_exchange(
    method: &Method,
    status: StatusCode,
    completed: bool,
    request_bytes: u64,
    response_bytes: u64,
) {
    ::metrics::counter!(
        EXCHANGES_TOTAL,
        "method" => method.as_str().to_owned(),
        "status" => status.as_u16().to_string(),
        "completed" => if completed { "true" } else { "false" }
    )
    .increment(1);

    ::metrics::histogram!(BODY_BYTES, "direction" => "request").record(request_bytes as f64);
    ::metrics::histogram!(BODY_BYTES, "direction" => "response").record(response_bytes as f64);
}

/// Record a handler error.
pub fn record_handler_fault() {
    ::metrics::counter!(HANDLER_FAULTS_TOTAL).increment(1);
}
