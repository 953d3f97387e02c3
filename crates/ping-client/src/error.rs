//! Error types for ping-client.

use thiserror::Error;

/// Errors that can occur on the sender's side.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The dispatcher answered with a non-success status.
    #[error("Dispatcher rejected request ({status}): {error}")]
    Rejected { status: u16, error: String },

    /// Reading or writing the local store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Stored or received JSON could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Change-feed subscription error.
    #[error("Change feed error: {0}")]
    Feed(String),

    /// The cache task is no longer running.
    #[error("Ping cache closed")]
    CacheClosed,
}

impl ClientError {
    /// Whether retrying the same request may succeed.
    ///
    /// Network failures and server-side errors are retryable; rejections of
    /// the request itself are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Feed(_) => true,
            ClientError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for ping-client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        let rejected = |status| ClientError::Rejected {
            status,
            error: "x".to_string(),
        };
        assert!(rejected(500).is_retryable());
        assert!(!rejected(401).is_retryable());
        assert!(!rejected(404).is_retryable());
        assert!(ClientError::Feed("dropped".into()).is_retryable());
        assert!(!ClientError::CacheClosed.is_retryable());
    }
}
