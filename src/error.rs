//! Error types for merge and redaction operations.
//!
//! Every failure carries enough context to name the stage it came from and
//! the input that caused it, so callers can surface a client-correctable
//! message without digging through a chain of sources.

use thiserror::Error;

/// Result type alias for blackout operations.
pub type BlackoutResult<T> = Result<T, BlackoutError>;

/// Error type covering both pipelines, from request validation through
/// serialization of the output document.
#[derive(Debug, Error)]
pub enum BlackoutError {
    /// A required request field is missing or empty. Raised before any
    /// resource is acquired.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The source identifier uses a scheme other than http, https, or
    /// file. Raised before any I/O is attempted.
    #[error("unsupported scheme '{scheme}' in source '{source_id}'")]
    UnsupportedScheme { source_id: String, scheme: String },

    /// Fetching or opening a source failed: network error, non-success
    /// status, timeout, or missing local file.
    #[error("source '{source_id}' unavailable: {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    /// The document is not structurally valid PDF.
    #[error("failed to parse '{source_id}': {reason}")]
    Parse { source_id: String, reason: String },

    /// A single page's content stream could not be decoded. Whether this
    /// aborts the request is decided by [`PagePolicy`].
    ///
    /// [`PagePolicy`]: crate::extract::PagePolicy
    #[error("failed to decode page {page}: {reason}")]
    PageDecode { page: u32, reason: String },

    /// Drawing or mutating the open document failed.
    #[error("render failure on page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// The final document could not be written out.
    #[error("failed to serialize output document: {reason}")]
    Serialization { reason: String },
}

impl BlackoutError {
    /// Shorthand for an [`InvalidRequest`] with a formatted reason.
    ///
    /// [`InvalidRequest`]: BlackoutError::InvalidRequest
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`SourceUnavailable`] naming the offending input.
    ///
    /// [`SourceUnavailable`]: BlackoutError::SourceUnavailable
    pub fn source_unavailable(source_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}
