//! Main client implementation for the ElevenLabs API

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use elevenlabs_core::RetryConfig;
use elevenlabs_transport::{
    HttpRequest, HttpResponse, HttpTransport, StreamingResponse, Transport, TransportSession,
};
use http::Method;
use secrecy::SecretString;

use crate::{
    config::{ClientConfig, Environment},
    error::{Error, Result},
    resources::{TextToSpeech, Voices},
};

/// Main client for interacting with the ElevenLabs API.
///
/// Cheap to clone; clones share the HTTP connection pool and the lazily
/// created resources.
///
/// # Example
///
/// ```rust,no_run
/// use elevenlabs::Client;
///
/// # fn example() -> elevenlabs::Result<()> {
/// let client = Client::new("your-api-key")?;
/// let tts = client.text_to_speech();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    api: Arc<ApiContext>,

    // Lazy-initialized resources
    text_to_speech: OnceLock<TextToSpeech>,
    voices: OnceLock<Voices>,
}

/// What every resource needs to issue requests.
///
/// Resources hold this rather than a [`Client`], so the client's resource
/// cache never points back at the client itself.
pub(crate) struct ApiContext {
    transport: Arc<dyn Transport>,
    default_headers: Vec<(String, String)>,
}

impl ApiContext {
    /// Start a request carrying the client's default headers.
    pub(crate) fn request(&self, method: Method, path: impl Into<String>) -> HttpRequest {
        let mut request = HttpRequest::new(method, path);
        request.headers.extend(self.default_headers.iter().cloned());
        request
    }

    /// Send with retries; non-2xx responses become [`Error::Api`].
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(Error::from_response(&response));
        }
        Ok(response)
    }

    /// Send with retries and decode the JSON body.
    pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let response = self.send(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Send once and return the open body; non-2xx responses are read in
    /// full and become [`Error::Api`].
    pub(crate) async fn stream(&self, request: HttpRequest) -> Result<StreamingResponse> {
        let response = self.transport.stream(request).await?;
        if !response.is_success() {
            let buffered = response.into_buffered().await?;
            return Err(Error::from_response(&buffered));
        }
        Ok(response)
    }

    pub(crate) fn session(&self) -> &TransportSession {
        self.transport.session()
    }

    pub(crate) fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }
}

impl Client {
    /// Create a client for the production environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a client from `ELEVENLABS_*` environment variables.
    ///
    /// See [`ClientConfig::from_env`].
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Create a new client builder for advanced configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client over a custom transport, e.g. a test double.
    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(transport, Vec::new())
    }

    fn with_parts(transport: Arc<dyn Transport>, default_headers: Vec<(String, String)>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                api: Arc::new(ApiContext {
                    transport,
                    default_headers,
                }),
                text_to_speech: OnceLock::new(),
                voices: OnceLock::new(),
            }),
        }
    }

    /// Create a client from a configuration object.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate (see
    /// [`ClientConfig::validate`]), a default header is not valid text, or
    /// the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config
            .api_key
            .ok_or_else(|| Error::Authentication("API key is required".to_string()))?;

        let session = TransportSession::new(
            api_key,
            config.environment.base_url,
            config.environment.websocket_url,
        )
        .with_user_agent(config.user_agent)
        .with_timeout(config.timeout)
        .with_retry(config.retry);

        let mut default_headers = Vec::with_capacity(config.default_headers.len());
        for (name, value) in &config.default_headers {
            let value = value
                .to_str()
                .map_err(|_| Error::InvalidHeaderValue(name.to_string()))?;
            default_headers.push((name.to_string(), value.to_string()));
        }

        let transport = Arc::new(HttpTransport::new(session)?);
        Ok(Self::with_parts(transport, default_headers))
    }

    /// Access the text-to-speech endpoints.
    pub fn text_to_speech(&self) -> &TextToSpeech {
        self.inner
            .text_to_speech
            .get_or_init(|| TextToSpeech::new(Arc::clone(&self.inner.api)))
    }

    /// Access the voice library endpoints.
    pub fn voices(&self) -> &Voices {
        self.inner
            .voices
            .get_or_init(|| Voices::new(Arc::clone(&self.inner.api)))
    }

    /// Connection settings in use.
    pub fn session(&self) -> &TransportSession {
        self.inner.api.session()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", self.session())
            .finish_non_exhaustive()
    }
}

/// Builder for creating a configured Client.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set the API key for authentication.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(SecretString::new(api_key.into().into_boxed_str()));
        self
    }

    /// Select a predefined or custom environment.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Override the REST base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.environment.base_url = base_url.into();
        self
    }

    /// Override the WebSocket base URL.
    pub fn websocket_url(mut self, websocket_url: impl Into<String>) -> Self {
        self.config.environment.websocket_url = websocket_url.into();
        self
    }

    /// Set the default timeout for requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.retry = self.config.retry.with_max_attempts(max_retries);
        self
    }

    /// Replace the whole retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom default header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid according to HTTP specifications.
    pub fn default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let key_str = key.into();
        let value_str = value.into();

        let key: http::HeaderName = key_str
            .parse()
            .map_err(|_| Error::InvalidHeaderName(key_str.clone()))?;
        let value: http::HeaderValue = value_str
            .parse()
            .map_err(|_| Error::InvalidHeaderValue(value_str.clone()))?;

        self.config.default_headers.insert(key, value);
        Ok(self)
    }

    /// Build the client with the configured options.
    pub fn build(self) -> Result<Client> {
        Client::from_config(self.config)
    }
}
