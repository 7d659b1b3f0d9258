//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the capture
//! server. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::capture::layer::DEFAULT_TRACKING_HEADER;
use crate::capture::{console_sink, tracing_sink, CaptureOptions, Sink};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Traffic capture settings.
    pub capture: CaptureSettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:12345").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:12345".to_string(),
        }
    }
}

/// Where finished log entries go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Human-readable block on stdout.
    #[default]
    Console,
    /// Structured `tracing` event.
    Tracing,
    /// Entries are not dispatched.
    None,
}

impl SinkKind {
    /// Build the sink callback for this kind.
    pub fn build(self) -> Option<Sink> {
        match self {
            SinkKind::Console => Some(console_sink()),
            SinkKind::Tracing => Some(tracing_sink()),
            SinkKind::None => None,
        }
    }
}

/// Traffic capture settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Response header carrying the correlation id.
    pub tracking_header_name: String,

    /// Maximum request body bytes rendered per entry (absent = unbounded).
    pub max_request_body_bytes: Option<u64>,

    /// Maximum response body bytes rendered per entry (absent = unbounded).
    pub max_response_body_bytes: Option<u64>,

    /// Sink receiving finished entries.
    pub sink: SinkKind,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            tracking_header_name: DEFAULT_TRACKING_HEADER.to_string(),
            max_request_body_bytes: Some(64 * 1024),
            max_response_body_bytes: Some(64 * 1024),
            sink: SinkKind::Console,
        }
    }
}

impl CaptureSettings {
    /// Layer options for these settings, with the configured sink.
    pub fn to_options(&self) -> CaptureOptions {
        CaptureOptions {
            tracking_header_name: Some(self.tracking_header_name.clone()),
            max_request_body_bytes: self.max_request_body_bytes,
            max_response_body_bytes: self.max_response_body_bytes,
            sink: self.sink.build(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for the handler to respond) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
