//! HTTP traffic capture middleware.
//!
//! Wraps any tower/axum service, assigns each exchange a correlation id,
//! mirrors request and response bodies as they stream, and hands one
//! [`LogEntry`](capture::LogEntry) per exchange to a caller-supplied sink.

// Core
pub mod capture;
pub mod error;

// Server and demo application
pub mod demo;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use capture::{CaptureLayer, CaptureOptions, CorrelationId, LogEntry};
pub use config::schema::AppConfig;
pub use error::CaptureError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
