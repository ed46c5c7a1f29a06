//! Error types for the analysis client

use thiserror::Error;

/// Errors surfaced by the analysis client.
///
/// Malformed frames never show up here: the decoder is deliberately lenient
/// so the protocol can grow new event kinds without breaking old clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Network-level failure: connect error, broken response body, or a
    /// stalled stream.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request was abandoned before the stream completed.
    #[error("analysis cancelled")]
    Cancelled,

    /// A request that can never be sent (empty file, bad server URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
