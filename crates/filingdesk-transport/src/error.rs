//! Error types for the transport boundary.

use thiserror::Error;

use filingdesk_core::retry::is_retryable_status;

/// Realtime channel socket errors. Never surfaced to the UI: they only
/// drive the reconnect state machine.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("socket error: {0}")]
    Socket(String),

    #[error("connection closed")]
    Closed,
}

/// Outcome of a failed request, as seen by the caller.
///
/// A request that failed after retries is indistinguishable from one that
/// failed on the first attempt.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("invalid request: {0}")]
    InvalidUrl(String),
}

impl RequestError {
    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Only 5xx responses are transient.
    pub fn is_retryable(&self) -> bool {
        self.status().is_some_and(is_retryable_status)
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
