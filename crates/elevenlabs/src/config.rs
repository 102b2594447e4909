//! Configuration for the ElevenLabs client

use crate::error::{Error, Result};
use elevenlabs_core::RetryConfig;
use elevenlabs_transport::session::DEFAULT_TIMEOUT;
use http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Default REST endpoint.
pub const PRODUCTION_BASE_URL: &str = "https://api.elevenlabs.io";

/// Default WebSocket endpoint.
pub const PRODUCTION_WEBSOCKET_URL: &str = "wss://api.elevenlabs.io";

/// REST endpoint with US data residency.
pub const PRODUCTION_US_BASE_URL: &str = "https://api.us.elevenlabs.io";

/// REST endpoint with EU data residency.
pub const PRODUCTION_EU_BASE_URL: &str = "https://api.eu.residency.elevenlabs.io";

/// A pair of REST and WebSocket endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Base URL for HTTP requests
    pub base_url: String,
    /// Base URL for WebSocket connections
    pub websocket_url: String,
}

impl Environment {
    /// The global production environment.
    pub fn production() -> Self {
        Self::custom(PRODUCTION_BASE_URL, PRODUCTION_WEBSOCKET_URL)
    }

    /// Production with US data residency.
    pub fn production_us() -> Self {
        Self::custom(PRODUCTION_US_BASE_URL, PRODUCTION_WEBSOCKET_URL)
    }

    /// Production with EU data residency.
    pub fn production_eu() -> Self {
        Self::custom(PRODUCTION_EU_BASE_URL, PRODUCTION_WEBSOCKET_URL)
    }

    /// Any other pair of endpoints, e.g. a proxy or a mock server.
    pub fn custom(base_url: impl Into<String>, websocket_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            websocket_url: websocket_url.into(),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::production()
    }
}

/// Configuration for the ElevenLabs client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent as `xi-api-key`
    pub api_key: Option<SecretString>,

    /// REST and WebSocket endpoints
    pub environment: Environment,

    /// Default timeout for each HTTP request
    pub timeout: Duration,

    /// `User-Agent` sent with every request
    pub user_agent: String,

    /// Retry behavior for non-streaming requests
    pub retry: RetryConfig,

    /// Custom headers to include with every request and handshake
    pub default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            environment: Environment::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("elevenlabs-rust/{}", crate::VERSION),
            retry: RetryConfig::default(),
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(api_key.into().into_boxed_str())),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables (and a `.env` file if
    /// one exists).
    ///
    /// This will look for:
    /// - `ELEVENLABS_API_KEY` for authentication
    /// - `ELEVENLABS_BASE_URL` for the REST endpoint
    /// - `ELEVENLABS_WEBSOCKET_URL` for the WebSocket endpoint
    /// - `ELEVENLABS_TIMEOUT` for request timeout (in seconds)
    /// - `ELEVENLABS_MAX_RETRIES` for maximum retry attempts
    ///
    /// Unparseable numeric values are ignored with a warning.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        use std::env;

        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            tracing::warn!(error = %err, "Failed to load .env file");
        }

        let mut config = Self::default();

        if let Ok(api_key) = env::var("ELEVENLABS_API_KEY") {
            config.api_key = Some(SecretString::new(api_key.into_boxed_str()));
        }

        if let Ok(base_url) = env::var("ELEVENLABS_BASE_URL") {
            config.environment.base_url = base_url;
        }

        if let Ok(websocket_url) = env::var("ELEVENLABS_WEBSOCKET_URL") {
            config.environment.websocket_url = websocket_url;
        }

        if let Ok(timeout_str) = env::var("ELEVENLABS_TIMEOUT") {
            match timeout_str.parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %timeout_str, "Ignoring invalid ELEVENLABS_TIMEOUT"),
            }
        }

        if let Ok(max_retries_str) = env::var("ELEVENLABS_MAX_RETRIES") {
            match max_retries_str.parse::<u32>() {
                Ok(max_retries) => config.retry = config.retry.with_max_attempts(max_retries),
                Err(_) => {
                    tracing::warn!(value = %max_retries_str, "Ignoring invalid ELEVENLABS_MAX_RETRIES")
                }
            }
        }

        Ok(config)
    }

    /// Check that the configuration can produce a working client.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if no non-empty API key is set
    /// - [`Error::InvalidUrl`] if the base URL is not http(s) or the
    ///   WebSocket URL is not ws(s)
    pub fn validate(&self) -> Result<()> {
        match &self.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => {}
            _ => {
                return Err(Error::Authentication(
                    "API key is required; set it on the builder or via ELEVENLABS_API_KEY".to_string(),
                ));
            }
        }

        check_scheme(&self.environment.base_url, &["http", "https"])?;
        check_scheme(&self.environment.websocket_url, &["ws", "wss"])?;
        Ok(())
    }
}

fn check_scheme(raw: &str, allowed: &[&str]) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("'{}': {}", raw, e)))?;
    if !allowed.contains(&url.scheme()) {
        return Err(Error::InvalidUrl(format!(
            "'{}' must use one of: {}",
            raw,
            allowed.join(", ")
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidUrl(format!("'{}' has no host", raw)));
    }
    Ok(())
}
