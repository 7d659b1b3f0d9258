//! Correlation identifiers and finished log entries.

use std::fmt;
use std::time::Duration;

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use uuid::Uuid;

/// Unique identifier assigned to one exchange.
///
/// Rendered as a lowercase hyphenated UUID in the tracking header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a fresh random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The identifier as a header value.
    pub fn header_value(&self) -> HeaderValue {
        let mut buf = Uuid::encode_buffer();
        let text = self.0.hyphenated().encode_lower(&mut buf);
        HeaderValue::from_str(text).expect("hyphenated UUID is a valid header value")
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Lets handlers behind the capture layer read the exchange's identifier.
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CorrelationId>().copied().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Correlation id missing; is CaptureLayer installed?",
        ))
    }
}

/// Record of one completed exchange.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: CorrelationId,
    pub method: Method,
    pub uri: Uri,
    pub request_headers: HeaderMap,
    /// Request body preview. `None` when the request declared no content type.
    pub request_body: Option<String>,
    /// Request body bytes observed, regardless of preview truncation.
    pub request_length: u64,
    pub status: StatusCode,
    pub reason: Option<String>,
    /// Response headers as sent, including the tracking header.
    pub response_headers: HeaderMap,
    /// Response body preview. `None` when the response declared no content type.
    pub response_body: Option<String>,
    /// Response body bytes observed, regardless of preview truncation.
    pub response_length: u64,
    /// False if the response body was dropped or failed before its end.
    pub completed: bool,
    /// Time from request arrival to the end of the response body.
    pub elapsed: Duration,
}
