//! Streaming responses of the text-to-speech endpoints
//!
//! Both streams are single-pass views over an open HTTP body. Dropping one
//! releases the connection.

use bytes::{Bytes, BytesMut};
use elevenlabs_transport::ChunkStream;
use futures::{Stream, TryStreamExt};
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tracing::debug;

use crate::{
    error::{Error, Result},
    types::TimestampChunk,
};

/// Audio bytes as they arrive from the streaming endpoint.
///
/// Each item is one read of up to 8192 bytes. A read failure or cancellation
/// is yielded once as the final item.
#[pin_project]
pub struct AudioStream {
    #[pin]
    inner: ChunkStream,
}

impl AudioStream {
    pub(crate) fn new(inner: ChunkStream) -> Self {
        Self { inner }
    }

    /// Drain the stream into one buffer.
    pub async fn collect_bytes(self) -> Result<Bytes> {
        let buffer = self
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        Ok(buffer.freeze())
    }
}

impl Stream for AudioStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project()
            .inner
            .poll_next(cx)
            .map(|item| item.map(|chunk| chunk.map_err(Error::from)))
    }
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream").finish_non_exhaustive()
    }
}

/// Timestamped audio chunks, one per JSON line.
///
/// Blank or undecodable lines are skipped. A read failure or cancellation is
/// yielded once as the final item.
#[pin_project]
pub struct TimestampStream {
    #[pin]
    lines: ChunkStream,
}

impl TimestampStream {
    pub(crate) fn new(lines: ChunkStream) -> Self {
        Self { lines }
    }
}

impl Stream for TimestampStream {
    type Item = Result<TimestampChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            let line = match ready!(this.lines.as_mut().poll_next(cx)) {
                None => return Poll::Ready(None),
                Some(Err(err)) => return Poll::Ready(Some(Err(err.into()))),
                Some(Ok(line)) => line,
            };
            if line.trim_ascii().is_empty() {
                continue;
            }
            match serde_json::from_slice::<TimestampChunk>(&line) {
                Ok(chunk) => return Poll::Ready(Some(Ok(chunk))),
                Err(err) => debug!(error = %err, len = line.len(), "Skipping undecodable timestamp line"),
            }
        }
    }
}

impl std::fmt::Debug for TimestampStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampStream").finish_non_exhaustive()
    }
}
