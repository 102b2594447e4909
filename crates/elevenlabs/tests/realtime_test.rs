//! Realtime conversion against a local WebSocket server

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use elevenlabs::{Client, Error, OutputFormat, RealtimeRequest, VoiceSettings};
use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

/// What the server saw during one connection.
#[derive(Debug, Default)]
struct Captured {
    uri: String,
    api_key: Option<String>,
    messages: Vec<Value>,
    client_closed: bool,
}

struct TtsServer {
    url: String,
    captured: oneshot::Receiver<Captured>,
}

/// Accept one connection, record every JSON message, and send `replies` once
/// the end-of-input marker arrives.
async fn tts_server(replies: Vec<Value>) -> TtsServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let handshake = Arc::new(Mutex::new(Captured::default()));
        let record = Arc::clone(&handshake);
        let callback = move |request: &Request, response: Response| {
            let mut captured = record.lock().unwrap();
            captured.uri = request.uri().to_string();
            captured.api_key = request
                .headers()
                .get("xi-api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Ok(response)
        };
        let mut socket = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .unwrap();
        let mut captured = std::mem::take(&mut *handshake.lock().unwrap());

        while let Some(Ok(message)) = socket.next().await {
            match message {
                Message::Text(text) => {
                    let value: Value = serde_json::from_str(&text).unwrap();
                    let end_of_input = value["text"] == "";
                    captured.messages.push(value);
                    if end_of_input {
                        for reply in &replies {
                            socket.send(Message::Text(reply.to_string())).await.unwrap();
                        }
                    }
                }
                Message::Close(_) => {
                    captured.client_closed = true;
                    break;
                }
                _ => {}
            }
        }
        let _ = done_tx.send(captured);
    });

    TtsServer {
        url: format!("ws://{}", addr),
        captured: done_rx,
    }
}

fn client(websocket_url: &str) -> Client {
    Client::builder()
        .api_key(common::test_api_key())
        .websocket_url(websocket_url)
        .build()
        .unwrap()
}

fn text(chunks: &[&str]) -> impl futures::Stream<Item = String> + Send + 'static {
    futures::stream::iter(chunks.iter().map(|s| s.to_string()).collect::<Vec<_>>())
}

async fn captured(server: TtsServer) -> Captured {
    tokio::time::timeout(Duration::from_secs(5), server.captured)
        .await
        .expect("server did not finish")
        .unwrap()
}

#[tokio::test]
async fn test_realtime_conversion_end_to_end() {
    let server = tts_server(vec![
        json!({"audio": "QVVE", "isFinal": null, "alignment": {"chars": ["h"]}}),
        json!({"audio": "SU9EQVRB", "isFinal": null}),
        json!({"audio": null, "isFinal": true}),
    ])
    .await;

    let request = RealtimeRequest::builder()
        .voice_id("v1")
        .model_id("eleven_flash_v2_5")
        .output_format(OutputFormat::Pcm16000)
        .voice_settings(VoiceSettings {
            stability: Some(0.5),
            ..Default::default()
        })
        .build()
        .unwrap();

    let stream = client(&server.url)
        .text_to_speech()
        .convert_realtime(request, text(&["Hello ", "", "world."]))
        .await
        .unwrap();

    let chunks: Vec<_> = stream.map(|chunk| chunk.unwrap()).collect().await;
    assert_eq!(chunks.concat(), b"AUDIODATA");

    let seen = captured(server).await;
    assert_eq!(
        seen.uri,
        "/v1/text-to-speech/v1/stream-input?model_id=eleven_flash_v2_5&output_format=pcm_16000"
    );
    assert_eq!(seen.api_key.as_deref(), Some("k"));
    assert_eq!(
        seen.messages,
        vec![
            json!({"text": " ", "voice_settings": {"stability": 0.5}}),
            json!({"text": "Hello "}),
            json!({"text": "world."}),
            json!({"text": ""}),
        ]
    );
    assert!(seen.client_closed);
}

#[tokio::test]
async fn test_realtime_skips_undecodable_frames() {
    let server = tts_server(vec![
        json!("not an object"),
        json!({"audio": "QQ=="}),
        json!({"isFinal": true}),
    ])
    .await;

    let request = RealtimeRequest::builder().voice_id("v1").build().unwrap();
    let stream = client(&server.url)
        .text_to_speech()
        .convert_realtime(request, text(&["hi"]))
        .await
        .unwrap();

    let chunks: Vec<_> = stream.map(|chunk| chunk.unwrap()).collect().await;
    assert_eq!(chunks.concat(), b"A");

    let seen = captured(server).await;
    assert_eq!(seen.uri, "/v1/text-to-speech/v1/stream-input");
}

#[tokio::test]
async fn test_realtime_error_frame_ends_stream() {
    let server = tts_server(vec![
        json!({"audio": "QQ=="}),
        json!({"error": "quota_exceeded", "message": "out of credits"}),
        json!({"audio": "Qg=="}),
    ])
    .await;

    let request = RealtimeRequest::builder().voice_id("v1").build().unwrap();
    let stream = client(&server.url)
        .text_to_speech()
        .convert_realtime(request, text(&["hi"]))
        .await
        .unwrap();

    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(&items[0].as_ref().unwrap()[..], b"A");
    assert_matches!(&items[1], Err(Error::Streaming(msg)) if msg.contains("out of credits"));

    assert!(captured(server).await.client_closed);
}

#[tokio::test]
async fn test_realtime_cancel_yields_cancelled_and_closes() {
    let server = tts_server(Vec::new()).await;

    let request = RealtimeRequest::builder().voice_id("v1").build().unwrap();
    let mut stream = client(&server.url)
        .text_to_speech()
        .convert_realtime(request, futures::stream::pending::<String>())
        .await
        .unwrap();

    stream.cancel();
    let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert_matches!(first, Some(Err(Error::Cancelled)));
    assert!(stream.next().await.is_none());

    let seen = captured(server).await;
    assert!(seen.client_closed);
    assert_eq!(seen.messages, vec![json!({"text": " "})]);
}

#[tokio::test]
async fn test_cancel_with_full_buffer_still_reports_cancelled() {
    let server = tts_server(vec![json!({"audio": "QQ=="}); 40]).await;

    let request = RealtimeRequest::builder().voice_id("v1").build().unwrap();
    let stream = client(&server.url)
        .text_to_speech()
        .convert_realtime(request, text(&["hi"]))
        .await
        .unwrap();

    // Let the receiver fill the channel before anything is consumed.
    tokio::time::sleep(Duration::from_millis(300)).await;
    stream.cancel();

    let items: Vec<_> = tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .unwrap();

    let (last, audio) = items.split_last().unwrap();
    assert_matches!(last, Err(Error::Cancelled));
    assert!(!audio.is_empty());
    assert!(audio.iter().all(|chunk| matches!(chunk, Ok(bytes) if &bytes[..] == b"A")));

    assert!(captured(server).await.client_closed);
}

#[tokio::test]
async fn test_dropping_output_closes_connection() {
    let server = tts_server(Vec::new()).await;

    let request = RealtimeRequest::builder().voice_id("v1").build().unwrap();
    let stream = client(&server.url)
        .text_to_speech()
        .convert_realtime(request, futures::stream::pending::<String>())
        .await
        .unwrap();
    drop(stream);

    assert!(captured(server).await.client_closed);
}

#[tokio::test]
async fn test_realtime_connect_failure_is_reported() {
    // Nothing listens on the discard port.
    let request = RealtimeRequest::builder().voice_id("v1").build().unwrap();
    let err = client("ws://127.0.0.1:9")
        .text_to_speech()
        .convert_realtime(request, text(&["hi"]))
        .await
        .unwrap_err();

    assert_matches!(err, Error::Transport(_));
}

#[tokio::test]
async fn test_realtime_rejects_bad_voice_id() {
    let request = RealtimeRequest::builder().voice_id("a/b").build().unwrap();
    let err = client("ws://127.0.0.1:9")
        .text_to_speech()
        .convert_realtime(request, text(&["hi"]))
        .await
        .unwrap_err();

    assert_matches!(err, Error::InvalidRequest(_));
}
