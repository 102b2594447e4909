//! Request/response types and the `Transport` trait
//!
//! The SDK's resources talk to a `Transport` rather than to reqwest directly,
//! so tests can substitute their own implementation.

use crate::error::{Result, TransportError};
use crate::http::MultipartForm;
use crate::session::TransportSession;
use crate::stream::{ChunkStream, DEFAULT_CHUNK_SIZE};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use http::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

/// Body of an outgoing request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// Raw bytes, sent with whatever `Content-Type` the caller set
    Bytes(Bytes),
    /// `multipart/form-data`; rebuilt for every attempt
    Multipart(MultipartForm),
}

/// HTTP request specification
///
/// Paths are relative to the session's base URL.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,

    /// Path relative to the base URL
    pub path: String,

    /// Query parameters, in order
    pub query: Vec<(String, String)>,

    /// Caller headers. Applied after the fixed headers; a later entry
    /// replaces an earlier one with the same name.
    pub headers: Vec<(String, String)>,

    /// Request body
    pub body: RequestBody,

    /// Signal that aborts the request, including any backoff sleep
    pub cancel: Option<CancellationToken>,
}

impl HttpRequest {
    /// Create a new request
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            cancel: None,
        }
    }

    /// Shorthand for a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Shorthand for a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header to the request
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter when a value is present
    pub fn with_optional_query<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// Set a raw body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `Content-Type`
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `value` cannot be encoded.
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }

    /// Set a multipart body
    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Attach a cancellation signal
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Look up a caller header (case-insensitive, last entry wins)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a new HTTP response
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse response body as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the response body cannot be parsed as valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(TransportError::from)
    }

    /// Get a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A response whose body has not been read yet.
///
/// Dropping it releases the underlying connection. Convert it into a
/// [`ChunkStream`] to consume the body incrementally.
pub struct StreamingResponse {
    status: u16,
    headers: HeaderMap,
    body: BoxStream<'static, std::io::Result<Bytes>>,
    cancel: CancellationToken,
}

impl StreamingResponse {
    /// Wrap a live body stream.
    pub fn new(
        status: u16,
        headers: HeaderMap,
        body: BoxStream<'static, std::io::Result<Bytes>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            cancel,
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        StatusCode::from_u16(self.status).is_ok_and(|s| s.is_success())
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Read the remaining body into memory.
    ///
    /// Used for error responses, which are small.
    pub async fn into_buffered(self) -> Result<HttpResponse> {
        let Self {
            status,
            headers,
            body,
            cancel,
        } = self;
        let collect = body.try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok::<_, std::io::Error>(acc)
        });
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            body = collect => body?,
        };
        Ok(HttpResponse::new(status, headers, body))
    }

    /// Consume the body as fixed-size byte chunks.
    pub fn into_byte_chunks(self, chunk_size: usize) -> ChunkStream {
        ChunkStream::bytes(StreamReader::new(self.body), chunk_size, self.cancel)
    }

    /// Consume the body as chunks of [`DEFAULT_CHUNK_SIZE`] bytes.
    pub fn into_default_chunks(self) -> ChunkStream {
        self.into_byte_chunks(DEFAULT_CHUNK_SIZE)
    }

    /// Consume the body as newline-delimited lines.
    pub fn into_lines(self) -> ChunkStream {
        ChunkStream::lines(StreamReader::new(self.body), self.cancel)
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Generic transport for the SDK's HTTP traffic
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request, retrying per the session's retry configuration.
    ///
    /// Non-2xx responses are returned as `Ok`; callers decide how to map them.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Send a request exactly once and return the unread response.
    async fn stream(&self, request: HttpRequest) -> Result<StreamingResponse>;

    /// Settings this transport was built with.
    fn session(&self) -> &TransportSession;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::post("/v1/text-to-speech/abc")
            .with_header("Accept", "audio/mpeg")
            .with_header("accept", "application/json")
            .with_query("output_format", "mp3_44100_128")
            .with_optional_query("enable_logging", None::<bool>)
            .with_optional_query("optimize_streaming_latency", Some(2));

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header("ACCEPT"), Some("application/json"));
        assert_eq!(
            request.query,
            vec![
                ("output_format".to_string(), "mp3_44100_128".to_string()),
                ("optimize_streaming_latency".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_json_sets_content_type() {
        let request = HttpRequest::post("/x")
            .with_json(&serde_json::json!({"text": "hi"}))
            .unwrap();

        assert_eq!(request.header("content-type"), Some("application/json"));
        match request.body {
            RequestBody::Bytes(body) => assert_eq!(&body[..], br#"{"text":"hi"}"#),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_http_response_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", "3".parse().unwrap());
        let response = HttpResponse::new(201, headers, &br#"{"a":1}"#[..]);

        assert!(response.is_success());
        assert_eq!(response.header("Retry-After"), Some("3"));
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["a"], 1);
        assert!(!HttpResponse::new(404, HeaderMap::new(), Bytes::new()).is_success());
    }

    #[tokio::test]
    async fn test_streaming_response_buffers() {
        let body = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"AUDIO")),
            Ok(Bytes::from_static(b"DATA")),
        ]);
        let response = StreamingResponse::new(
            500,
            HeaderMap::new(),
            Box::pin(body),
            CancellationToken::new(),
        );

        assert!(!response.is_success());
        let buffered = response.into_buffered().await.unwrap();
        assert_eq!(&buffered.body[..], b"AUDIODATA");
    }
}
