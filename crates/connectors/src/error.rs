//! Connector error types.

use thiserror::Error;

/// Errors raised while talking to a vendor API.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// Network failure before a response was received.
    #[error("network error: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The vendor answered with a non-success status.
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    /// Credentials were rejected or a token could not be minted.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The vendor throttled the request.
    #[error("rate limited by vendor")]
    RateLimited,

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The connector was configured with unusable settings.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ConnectorError {
    /// Returns true if the error is transient and the call may succeed later.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ConnectorError::Timeout
        } else if e.is_decode() {
            ConnectorError::Decode(e.to_string())
        } else {
            ConnectorError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::Decode(e.to_string())
    }
}

impl From<gcp_auth::Error> for ConnectorError {
    fn from(e: gcp_auth::Error) -> Self {
        ConnectorError::Auth(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_retry() {
        assert!(ConnectorError::Timeout.should_retry());
        assert!(ConnectorError::RateLimited.should_retry());
        assert!(ConnectorError::Http {
            status: 503,
            body: String::new()
        }
        .should_retry());
    }

    #[test]
    fn test_permanent_errors_do_not_retry() {
        assert!(!ConnectorError::Auth("bad key".to_string()).should_retry());
        assert!(!ConnectorError::Http {
            status: 404,
            body: "missing".to_string()
        }
        .should_retry());
    }
}
