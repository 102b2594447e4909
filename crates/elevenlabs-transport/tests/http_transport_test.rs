//! Integration tests for HTTP transport

use elevenlabs_core::RetryConfig;
use elevenlabs_transport::{
    CancellationToken, FileUpload, HttpRequest, HttpTransport, MultipartForm, Transport,
    TransportError, TransportSession,
};
use futures::StreamExt;
use secrecy::SecretString;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_string_contains, header, header_exists, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig::builder()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(10))
        .jitter_factor(0.0)
        .build()
}

fn transport(base_url: &str, retry: RetryConfig) -> HttpTransport {
    let session = TransportSession::new(SecretString::new("k".into()), base_url, "ws://unused")
        .with_retry(retry);
    HttpTransport::new(session).expect("Failed to create transport")
}

#[tokio::test]
async fn test_fixed_headers_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .and(header("xi-api-key", "k"))
        .and(header_regex("user-agent", "^elevenlabs-rust/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let response = tokio_test::assert_ok!(
        transport(&server.uri(), fast_retry(0))
            .send(HttpRequest::get("v1/voices"))
            .await
    );

    assert_eq!(response.status, 200);
    server.verify().await;
}

#[tokio::test]
async fn test_always_503_makes_max_attempts_plus_one_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/v1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(4)
        .mount(&server)
        .await;

    let response = transport(&server.uri(), fast_retry(3))
        .send(HttpRequest::post("/v1/text-to-speech/v1").with_body("{}"))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.text(), "overloaded");
    server.verify().await;
}

#[tokio::test]
async fn test_non_retryable_status_returned_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/voices/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"detail":"not found"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server.uri(), fast_retry(3))
        .send(HttpRequest::get("/v1/voices/missing"))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    server.verify().await;
}

#[tokio::test]
async fn test_429_then_success_honors_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"voices":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let response = transport(&server.uri(), fast_retry(3))
        .send(HttpRequest::get("/v1/voices"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(started.elapsed() >= Duration::from_secs(1));
    server.verify().await;
}

#[tokio::test]
async fn test_cancellation_during_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = transport(&server.uri(), fast_retry(3))
        .send(HttpRequest::get("/v1/voices").with_cancellation(cancel))
        .await;

    assert!(matches!(result, Err(TransportError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_already_cancelled_request_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = transport(&server.uri(), fast_retry(3))
        .send(HttpRequest::get("/v1/voices").with_cancellation(cancel))
        .await;

    assert!(matches!(result, Err(TransportError::Cancelled)));
    server.verify().await;
}

#[tokio::test]
async fn test_connection_errors_retried_then_surfaced() {
    // Nothing listens on the discard port.
    let result = transport("http://127.0.0.1:9", fast_retry(2))
        .send(HttpRequest::get("/v1/voices"))
        .await;

    let err = result.unwrap_err();
    assert!(err.is_retryable(), "unexpected error {err:?}");
}

#[tokio::test]
async fn test_cancellation_during_connection_error_backoff() {
    let retry = RetryConfig::builder()
        .max_attempts(3)
        .initial_delay(Duration::from_secs(20))
        .max_delay(Duration::from_secs(20))
        .jitter_factor(0.0)
        .build();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    // Nothing listens on the discard port, so every attempt fails to connect.
    let started = Instant::now();
    let result = transport("http://127.0.0.1:9", retry)
        .send(HttpRequest::get("/v1/voices").with_cancellation(cancel))
        .await;

    assert!(
        matches!(result, Err(TransportError::Cancelled)),
        "unexpected result {result:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_query_parameters_and_caller_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/v1"))
        .and(query_param("output_format", "mp3_44100_128"))
        .and(header("accept", "audio/mpeg"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains(r#""text":"hi""#))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"AUDIODATA".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let request = HttpRequest::post("/v1/text-to-speech/v1")
        .with_query("output_format", "mp3_44100_128")
        .with_header("Accept", "audio/mpeg")
        .with_json(&serde_json::json!({"text": "hi"}))
        .unwrap();
    let response = transport(&server.uri(), fast_retry(0)).send(request).await.unwrap();

    assert_eq!(&response.body[..], b"AUDIODATA");
    server.verify().await;
}

#[tokio::test]
async fn test_multipart_resent_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/voices/add"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("My Voice"))
        .and(body_string_contains("sample.mp3"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/voices/add"))
        .and(body_string_contains("sample.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"voice_id":"new"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let form = MultipartForm::new()
        .text("name", "My Voice")
        .file(FileUpload::from_bytes("files", "sample.mp3", &b"ID3 sample"[..]));
    let response = transport(&server.uri(), fast_retry(1))
        .send(HttpRequest::post("/v1/voices/add").with_multipart(form))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    server.verify().await;
}

#[tokio::test]
async fn test_stream_is_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/v1/stream"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server.uri(), fast_retry(3))
        .stream(HttpRequest::post("/v1/text-to-speech/v1/stream"))
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    let buffered = response.into_buffered().await.unwrap();
    assert_eq!(buffered.text(), "busy");
    server.verify().await;
}

#[tokio::test]
async fn test_stream_chunks_reassemble_body() {
    let body: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/v1/stream"))
        .and(header_exists("xi-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let response = transport(&server.uri(), fast_retry(0))
        .stream(HttpRequest::post("/v1/text-to-speech/v1/stream"))
        .await
        .unwrap();
    assert!(response.is_success());

    let chunks: Vec<_> = response
        .into_default_chunks()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

    assert!(chunks.iter().all(|c| c.len() <= 8192));
    assert_eq!(chunks.concat(), body);
}

#[tokio::test]
async fn test_stream_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"a\":1}\n{\"a\":2}\n"))
        .mount(&server)
        .await;

    let response = transport(&server.uri(), fast_retry(0))
        .stream(HttpRequest::post("/v1/text-to-speech/v1/stream-with-timestamps"))
        .await
        .unwrap();

    let lines: Vec<_> = response.into_lines().map(|l| l.unwrap()).collect().await;
    assert_eq!(lines.len(), 2);
    assert_eq!(&lines[1][..], br#"{"a":2}"#);
}
