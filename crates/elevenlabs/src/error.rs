//! Error types for the ElevenLabs SDK
//!
//! Every non-2xx response becomes one tagged [`Error::Api`] carrying the
//! status, a coarse [`ApiErrorKind`] and the parsed error body. Transport
//! failures keep their [`TransportError`] as the source, except cancellation
//! and "not connected", which get their own variants.

use elevenlabs_transport::{HttpResponse, TransportError};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for operations that can fail with an SDK error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ElevenLabs SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// The API answered with a non-2xx status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// Coarse classification of the status code
        kind: ApiErrorKind,
        /// HTTP status code
        status: u16,
        /// Parsed error body (JSON when possible, otherwise the raw text)
        body: Option<Value>,
        /// Human-readable message extracted from the body
        message: String,
    },

    /// No usable API key was configured.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network, timeout or protocol failure below the API layer.
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),

    /// A WebSocket operation was attempted without an open connection.
    #[error("WebSocket not connected")]
    NotConnected,

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// Failed to serialize a request or deserialize a response.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Missing required configuration.
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// Invalid HTTP header name.
    #[error("Invalid HTTP header name: {0}")]
    InvalidHeaderName(String),

    /// Invalid HTTP header value.
    #[error("Invalid HTTP header value: {0}")]
    InvalidHeaderValue(String),

    /// Malformed data inside a streamed or realtime payload.
    #[error("Streaming error: {0}")]
    Streaming(String),

    /// Audio file validation or playback failure.
    #[error("Audio error: {0}")]
    Audio(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of API error statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 422, usually a request validation failure
    UnprocessableEntity,
    /// 429
    RateLimited,
    /// 5xx
    Server,
    /// Any other non-2xx status
    Other,
}

impl ApiErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::UnprocessableEntity,
            429 => Self::RateLimited,
            s if s >= 500 => Self::Server,
            _ => Self::Other,
        }
    }
}

impl Error {
    /// Create an API error from a non-2xx response.
    ///
    /// The message is taken from the first of `detail`, `error` or `message`
    /// found in a JSON body. `detail` may itself be an object carrying a
    /// `message`, or a list of validation errors.
    pub fn from_response(response: &HttpResponse) -> Self {
        let status = response.status;
        let text = response.text();

        let (body, message) = match serde_json::from_slice::<Value>(&response.body) {
            Ok(json) => {
                let message = extract_message(&json)
                    .unwrap_or_else(|| format!("HTTP {} error", status));
                (Some(json), message)
            }
            Err(_) if text.trim().is_empty() => (None, format!("HTTP {} error", status)),
            Err(_) => (
                Some(Value::String(text.clone())),
                format!("HTTP {}: {}", status, text.trim()),
            ),
        };

        Error::Api {
            kind: ApiErrorKind::from_status(status),
            status,
            body,
            message,
        }
    }

    /// HTTP status code, for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error kind, for API errors.
    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Parsed error body, for API errors.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Error::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Check if this error is worth retrying at a higher level.
    ///
    /// The transport already retried these before surfacing them.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status, .. } => elevenlabs_core::should_retry(*status),
            Error::Transport(err) => err.is_retryable(),
            _ => false,
        }
    }
}

fn extract_message(json: &Value) -> Option<String> {
    if let Some(detail) = json.get("detail") {
        match detail {
            Value::String(s) => return Some(s.clone()),
            Value::Object(map) => {
                if let Some(Value::String(s)) = map.get("message") {
                    return Some(s.clone());
                }
            }
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return Some(messages.join("; "));
                }
            }
            _ => {}
        }
    }
    ["error", "message"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => Error::Cancelled,
            TransportError::NotConnected => Error::NotConnected,
            other => Error::Transport(other),
        }
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Error::InvalidRequest(format!("missing required field '{}'", err.field_name()))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Streaming(format!("invalid base64 audio: {}", err))
    }
}
