//! Feed error types

use thiserror::Error;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors surfaced by the live price feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("connection error: {message}")]
    Connection { message: String },

    #[error("invalid stream endpoint: {details}")]
    InvalidEndpoint { details: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("snapshot request failed: {0}")]
    Snapshot(#[from] reqwest::Error),

    #[error("feed has been shut down")]
    Shutdown,
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
