//! HTTP transport client implementation
//!
//! Implements the Transport trait with retry, backoff and cancellation.

use super::retry::{retry_after_hint, sleep_or_cancel};
use crate::error::{Result, TransportError};
use crate::session::{API_KEY_HEADER, TransportSession, header_value};
use crate::traits::{HttpRequest, HttpResponse, RequestBody, StreamingResponse, Transport};
use async_trait::async_trait;
use elevenlabs_core::{RetryPolicy, should_retry};
use futures::TryStreamExt;
use http::header::USER_AGENT;
use http::{HeaderMap, HeaderName};
use reqwest::Client as ReqwestClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// HTTP transport implementation
///
/// Handles HTTP requests with:
/// - Automatic retries with exponential backoff and jitter
/// - `Retry-After` support
/// - Cancellation of in-flight requests and backoff sleeps
/// - API key and `User-Agent` injection
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    session: Arc<TransportSession>,
    policy: RetryPolicy,
}

impl HttpTransport {
    /// Create a transport from session settings
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(session: TransportSession) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(session.timeout())
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let policy = RetryPolicy::new(*session.retry());

        Ok(Self {
            client,
            session: Arc::new(session),
            policy,
        })
    }

    /// Replace the retry policy, e.g. to inject a seeded jitter source
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The retry policy in use
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn headers_for(&self, request: &HttpRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            header_value(self.session.expose_api_key())?,
        );
        headers.insert(USER_AGENT, header_value(self.session.user_agent())?);

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidRequest(format!("invalid header name '{}'", name)))?;
            headers.insert(name, header_value(value)?);
        }
        Ok(headers)
    }

    fn build(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder> {
        let url = self.session.http_url(&request.path);
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(self.headers_for(request)?);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };
        Ok(builder)
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = builder.send() => result.map_err(TransportError::from),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let cancel = request.cancel.clone().unwrap_or_default();
        let max_attempts = self.policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..=max_attempts {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }

            let builder = self.build(&request)?;
            match self.execute(builder, &cancel).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if should_retry(status) && attempt < max_attempts {
                        let hint = retry_after_hint(response.headers());
                        drop(response);
                        let delay = self.policy.calculate_delay(attempt, hint.as_deref());
                        warn!(
                            method = %request.method,
                            path = %request.path,
                            status,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Retryable status, backing off"
                        );
                        sleep_or_cancel(delay, &cancel).await?;
                        continue;
                    }

                    debug!(method = %request.method, path = %request.path, status, attempt = attempt + 1, "Response received");
                    let headers = response.headers().clone();
                    let body = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                        body = response.bytes() => body?,
                    };
                    return Ok(HttpResponse::new(status, headers, body));
                }
                Err(TransportError::Cancelled) => return Err(TransportError::Cancelled),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.calculate_delay(attempt, None);
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        error = %err,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, backing off"
                    );
                    last_error = Some(err);
                    sleep_or_cancel(delay, &cancel).await?;
                }
                Err(err) => {
                    warn!(method = %request.method, path = %request.path, error = %err, "Request failed");
                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TransportError::Other("no attempts were made".to_string())))
    }

    async fn stream(&self, request: HttpRequest) -> Result<StreamingResponse> {
        let cancel = request.cancel.clone().unwrap_or_default();
        let builder = self.build(&request)?;
        let response = self.execute(builder, &cancel).await?;

        let status = response.status().as_u16();
        debug!(method = %request.method, path = %request.path, status, "Streaming response opened");

        let headers = response.headers().clone();
        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(StreamingResponse::new(status, headers, Box::pin(body), cancel))
    }

    fn session(&self) -> &TransportSession {
        &self.session
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("session", &self.session)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn transport() -> HttpTransport {
        let session = TransportSession::new(
            SecretString::new("test-key".into()),
            "https://api.example.com",
            "wss://api.example.com",
        );
        HttpTransport::new(session).expect("Failed to create transport")
    }

    #[test]
    fn test_fixed_headers_injected() {
        let transport = transport();
        let headers = transport.headers_for(&HttpRequest::get("/v1/voices")).unwrap();

        assert_eq!(headers.get("xi-api-key").unwrap(), "test-key");
        assert!(
            headers
                .get(USER_AGENT)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("elevenlabs-rust/")
        );
    }

    #[test]
    fn test_caller_headers_last_write_wins() {
        let transport = transport();
        let request = HttpRequest::get("/v1/voices")
            .with_header("User-Agent", "custom/1.0")
            .with_header("Accept", "audio/mpeg")
            .with_header("accept", "application/json");
        let headers = transport.headers_for(&request).unwrap();

        assert_eq!(headers.get(USER_AGENT).unwrap(), "custom/1.0");
        assert_eq!(headers.get_all("accept").iter().count(), 1);
        assert_eq!(headers.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let transport = transport();
        let request = HttpRequest::get("/x").with_header("bad header", "v");
        assert!(matches!(
            transport.headers_for(&request),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_policy_follows_session() {
        let transport = transport();
        assert_eq!(transport.retry_policy().max_attempts(), 3);
    }
}
