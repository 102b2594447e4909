//! Transport error types

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur in transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Connection could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request or handshake timed out
    #[error("Timeout")]
    Timeout,

    /// I/O error while reading a body
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket protocol or frame error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Operation requires an open WebSocket connection
    #[error("WebSocket not connected")]
    NotConnected,

    /// Operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Request could not be built (bad header, URL or multipart part)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generic transport error
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether a request that failed with this error may be attempted again.
    ///
    /// Only failures to obtain a response qualify. Cancellation, encoding
    /// problems and malformed requests fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Connection(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::Io(io) => Self::Io(io),
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::NotConnected,
            other => Self::WebSocket(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Connection("refused".into()).is_retryable());
        assert!(TransportError::Http("reset".into()).is_retryable());

        assert!(!TransportError::Cancelled.is_retryable());
        assert!(!TransportError::NotConnected.is_retryable());
        assert!(!TransportError::Serialization("eof".into()).is_retryable());
        assert!(!TransportError::InvalidRequest("bad header".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransportError::NotConnected.to_string(), "WebSocket not connected");
        assert_eq!(TransportError::Cancelled.to_string(), "Operation cancelled");
        assert_eq!(
            TransportError::Connection("dns".into()).to_string(),
            "Connection error: dns"
        );
    }
}
