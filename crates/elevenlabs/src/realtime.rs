//! Realtime text-to-speech over one WebSocket connection.
//!
//! Two tasks share a [`DuplexSession`]:
//!
//! - the **sender** drains the caller's text stream, sends each chunk, then
//!   the end-of-input marker (`{"text": ""}`);
//! - the **receiver** reads frames, decodes the base64 `audio` field and
//!   forwards it on a bounded channel until the final frame, a peer close,
//!   an error, cancellation, or the caller dropping the output.
//!
//! The sender owns teardown: it closes the session once the receiver is
//! done, so the connection is closed exactly once on every path.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use elevenlabs_transport::{CancellationToken, DuplexSession};
use futures::{Stream, StreamExt};
use pin_project::pin_project;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, debug, info, warn};

use crate::error::{Error, Result};
use crate::types::VoiceSettings;
use crate::types::text_to_speech::decode_audio;

/// Decoded audio chunks buffered ahead of the consumer.
const AUDIO_CHANNEL_CAPACITY: usize = 32;

#[derive(Serialize)]
struct InitMessage<'a> {
    text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_settings: Option<&'a VoiceSettings>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AudioMessage {
    audio: Option<String>,
    is_final: Option<bool>,
    error: Option<String>,
    message: Option<String>,
}

/// Audio produced by a realtime conversion.
///
/// Yields decoded audio chunks in arrival order. A failure or cancellation
/// is yielded once as the last item. Dropping the stream stops the
/// conversion and closes the connection.
#[pin_project]
pub struct RealtimeAudioStream {
    #[pin]
    inner: ReceiverStream<Result<Bytes>>,
    cancel: CancellationToken,
}

impl RealtimeAudioStream {
    /// Stop the conversion. Pending audio may still be yielded, followed by
    /// a cancellation error.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by both realtime tasks.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Stream for RealtimeAudioStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl std::fmt::Debug for RealtimeAudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeAudioStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Connect, send the initialization message and start both tasks.
pub(crate) async fn start<S>(
    session: DuplexSession,
    url: &str,
    headers: &[(String, String)],
    voice_settings: Option<&VoiceSettings>,
    text: S,
    cancel: CancellationToken,
) -> Result<RealtimeAudioStream>
where
    S: Stream<Item = String> + Send + 'static,
{
    session.connect(url, headers, &cancel).await?;

    let init = InitMessage {
        text: " ",
        voice_settings,
    };
    if let Err(err) = session.send(&init).await {
        if let Err(close_err) = session.close().await {
            debug!(error = %close_err, "Close after failed initialization");
        }
        return Err(err.into());
    }
    info!("Realtime conversion started");

    let session = Arc::new(session);
    let (tx, rx) = mpsc::channel(AUDIO_CHANNEL_CAPACITY);
    let receiver_done = CancellationToken::new();

    let receiver = tokio::spawn(
        receive_audio(
            Arc::clone(&session),
            tx.clone(),
            cancel.clone(),
            receiver_done.clone(),
        )
        .in_current_span(),
    );
    tokio::spawn(
        send_text(session, text, tx, cancel.clone(), receiver_done, receiver).in_current_span(),
    );

    Ok(RealtimeAudioStream {
        inner: ReceiverStream::new(rx),
        cancel,
    })
}

async fn send_text<S>(
    session: Arc<DuplexSession>,
    text: S,
    errors: mpsc::Sender<Result<Bytes>>,
    cancel: CancellationToken,
    receiver_done: CancellationToken,
    receiver: JoinHandle<()>,
) where
    S: Stream<Item = String> + Send + 'static,
{
    let mut text = std::pin::pin!(text);
    let mut failed = false;
    let mut sent = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = receiver_done.cancelled() => break,
            next = text.next() => next,
        };
        let (chunk, end_of_input) = match next {
            // An empty chunk would end the input early.
            Some(chunk) if chunk.is_empty() => continue,
            Some(chunk) => (chunk, false),
            None => (String::new(), true),
        };

        let message = TextMessage { text: &chunk };
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = receiver_done.cancelled() => break,
            result = session.send(&message) => result,
        };
        if let Err(err) = result {
            warn!(error = %err, end_of_input, "Failed to send text");
            failed = true;
            let _ = errors.try_send(Err(err.into()));
            break;
        }
        if end_of_input {
            debug!(chunks = sent, "Text input finished");
            break;
        }
        sent += 1;
    }
    drop(errors);

    // A failed send leaves the receiver nothing to wait for; closing first
    // wakes it.
    if failed || cancel.is_cancelled() {
        close(&session).await;
    }
    if let Err(err) = receiver.await {
        warn!(error = %err, "Realtime receiver task failed");
    }
    close(&session).await;
}

async fn receive_audio(
    session: Arc<DuplexSession>,
    tx: mpsc::Sender<Result<Bytes>>,
    cancel: CancellationToken,
    done: CancellationToken,
) {
    let _done = done.drop_guard();
    let mut chunks = 0usize;

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                report_cancelled(&tx).await;
                break;
            }
            _ = tx.closed() => {
                debug!("Realtime audio dropped by consumer");
                break;
            }
            frame = session.receive() => frame,
        };

        let data = match frame {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!("Realtime connection closed");
                break;
            }
            Err(err) => {
                forward(&tx, Err(err.into()), &cancel).await;
                break;
            }
        };

        let message: AudioMessage = match serde_json::from_slice(&data) {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, "Skipping undecodable realtime frame");
                continue;
            }
        };

        if let Some(error) = message.error {
            let detail = match message.message {
                Some(text) => format!("{}: {}", error, text),
                None => error,
            };
            forward(&tx, Err(Error::Streaming(detail)), &cancel).await;
            break;
        }

        if let Some(audio) = message.audio.filter(|audio| !audio.is_empty()) {
            let decoded = decode_audio(&audio);
            let ok = decoded.is_ok();
            if !forward(&tx, decoded, &cancel).await || !ok {
                break;
            }
            chunks += 1;
        }

        if message.is_final == Some(true) {
            debug!("Final realtime frame received");
            break;
        }
    }

    info!(chunks, "Realtime conversion finished");
}

/// Deliver one item, giving up if the consumer is gone or cancellation fires.
async fn forward(tx: &mpsc::Sender<Result<Bytes>>, item: Result<Bytes>, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            report_cancelled(tx).await;
            false
        }
        sent = tx.send(item) => sent.is_ok(),
    }
}

/// Queue the cancellation error behind any buffered audio. Waits for room
/// unless the consumer is gone.
async fn report_cancelled(tx: &mpsc::Sender<Result<Bytes>>) {
    tokio::select! {
        _ = tx.closed() => {}
        _ = tx.send(Err(Error::Cancelled)) => {}
    }
}

async fn close(session: &DuplexSession) {
    if let Err(err) = session.close().await {
        warn!(error = %err, "Failed to close realtime session");
    }
}
