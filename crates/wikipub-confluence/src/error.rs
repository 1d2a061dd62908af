//! Error types for Confluence integration.

/// Error from Confluence API operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// No space with the requested key is visible to the caller.
    #[error("space not found: {0}")]
    SpaceNotFound(String),

    /// Base URL cannot be used to build request URLs.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfluenceError {
    /// True if the server rejected a write because of a version conflict.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::HttpResponse { status: 409, .. })
    }
}
