//! Error types for the capture layer.

use thiserror::Error;

/// Errors raised while building a [`CaptureLayer`](crate::capture::CaptureLayer).
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The configured tracking header name is not a valid HTTP header name.
    #[error("Invalid tracking header name '{name}': {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
}
