//! Per-client connection settings shared by every request.

use crate::error::{Result, TransportError};
use elevenlabs_core::RetryConfig;
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;

/// Header carrying the API key on every HTTP request and WebSocket handshake.
pub const API_KEY_HEADER: &str = "xi-api-key";

/// Default timeout applied to each HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(240);

/// Default bound on the WebSocket opening handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable settings for one client: endpoints, credentials and retry policy.
///
/// Created once per client and shared read-only by concurrent requests.
#[derive(Clone)]
pub struct TransportSession {
    base_url: String,
    websocket_url: String,
    api_key: SecretString,
    user_agent: String,
    timeout: Duration,
    handshake_timeout: Duration,
    retry: RetryConfig,
}

impl TransportSession {
    /// Create settings with default timeouts and retry configuration.
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        websocket_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            websocket_url: websocket_url.into(),
            api_key,
            user_agent: format!("elevenlabs-rust/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }

    /// Set the `User-Agent` sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the WebSocket handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL for HTTP requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL for WebSocket connections.
    pub fn websocket_url(&self) -> &str {
        &self.websocket_url
    }

    /// The API key.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// The `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// WebSocket handshake timeout.
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    /// Retry configuration for non-streaming requests.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Resolve an API path against the HTTP base URL.
    ///
    /// ```rust
    /// use elevenlabs_transport::TransportSession;
    /// # use secrecy::SecretString;
    ///
    /// let session = TransportSession::new(
    ///     SecretString::new("k".into()),
    ///     "https://api.elevenlabs.io/",
    ///     "wss://api.elevenlabs.io",
    /// );
    /// assert_eq!(session.http_url("/v1/voices"), "https://api.elevenlabs.io/v1/voices");
    /// ```
    pub fn http_url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Resolve an API path against the WebSocket base URL.
    pub fn ws_url(&self, path: &str) -> String {
        join_url(&self.websocket_url, path)
    }

    pub(crate) fn expose_api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession")
            .field("base_url", &self.base_url)
            .field("websocket_url", &self.websocket_url)
            .field("api_key", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| TransportError::InvalidRequest("invalid header value".to_string()))
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
