//! Body preview rendering.
//!
//! # Responsibilities
//! - Decide whether a captured body is textual from its declared content type
//! - Resolve the charset parameter to a decoder
//! - Decode at most the render budget's worth of leading bytes
//!
//! # Design Decisions
//! - Content-type prefixes are compared case-sensitively
//! - Unknown charsets silently fall back to UTF-8
//! - Truncation is byte-level; a cut multi-byte sequence decodes to U+FFFD

use encoding_rs::{Encoding, UTF_8};

/// Content-type prefixes rendered as text.
pub const TEXT_CONTENT_TYPES: [&str; 3] = ["application/json", "application/xml", "text/"];

/// Marker used in place of a missing or empty content type.
pub const UNKNOWN_CONTENT_TYPE: &str = "N/A";

/// Turns captured body bytes into a loggable preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentRenderer {
    /// Maximum number of leading bytes decoded. `None` means unbounded.
    max_bytes: Option<u64>,
}

impl ContentRenderer {
    /// Create a renderer with the given byte budget.
    pub fn new(max_bytes: Option<u64>) -> Self {
        Self { max_bytes }
    }

    /// Create a renderer that decodes whole bodies.
    pub fn unbounded() -> Self {
        Self { max_bytes: None }
    }

    /// Get the configured byte budget.
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Render a body.
    ///
    /// `total` is the number of bytes observed on the wire, which may exceed
    /// `captured.len()` when capture was limited. Non-text bodies render as
    /// `"<content type> [<total> bytes]"`.
    pub fn render(&self, captured: &[u8], total: u64, content_type: Option<&str>) -> String {
        let content_type = content_type.unwrap_or_default();
        if !is_text_content_type(content_type) {
            let label = if content_type.is_empty() {
                UNKNOWN_CONTENT_TYPE
            } else {
                content_type
            };
            return format!("{} [{} bytes]", label, total);
        }

        let mut len = total.min(captured.len() as u64);
        if let Some(max) = self.max_bytes {
            len = len.min(max);
        }

        let (text, _) = resolve_encoding(content_type)
            .decode_without_bom_handling(&captured[..len as usize]);
        text.into_owned()
    }
}

/// Returns true if the content type is one rendered as text.
pub fn is_text_content_type(content_type: &str) -> bool {
    TEXT_CONTENT_TYPES
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
}

/// Extract the `charset=` parameter from a content type, if any.
///
/// The first `charset` parameter wins. Surrounding whitespace and double
/// quotes are stripped.
pub fn charset_param(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .map(str::trim)
        .find_map(|param| param.strip_prefix("charset="))
        .map(|value| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Resolve the decoder for a content type, defaulting to UTF-8.
pub fn resolve_encoding(content_type: &str) -> &'static Encoding {
    match charset_param(content_type) {
        Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
            tracing::trace!(charset = %label, "Unrecognized charset, decoding as UTF-8");
            UTF_8
        }),
        None => UTF_8,
    }
}
