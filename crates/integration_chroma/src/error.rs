//! Chroma client errors

use thiserror::Error;

/// Errors that can occur talking to the Chroma server
#[derive(Debug, Error)]
pub enum ChromaError {
    /// Connection to the server failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse a server response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Server returned a non-success status
    #[error("Server error: {0}")]
    ServerError(String),

    /// Request timed out
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout in milliseconds
        timeout_ms: u64,
    },
}

impl ChromaError {
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
