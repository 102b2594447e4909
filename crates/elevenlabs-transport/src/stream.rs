//! Incremental consumption of response bodies.
//!
//! A [`ChunkStream`] turns any `AsyncRead` into a lazy, single-pass stream of
//! byte chunks or text lines. Every read first checks the cancellation
//! token; once it fires the stream yields one [`TransportError::Cancelled`]
//! item and ends. The underlying reader is owned by the stream and released
//! exactly once, when the stream finishes or is dropped.

use crate::error::{Result, TransportError};
use bytes::Bytes;
use futures::Stream;
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Read size used by the byte-chunk streaming endpoints.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// A lazy sequence of body chunks.
///
/// Each `Ok` item owns its bytes; nothing aliases the internal read buffer.
/// A terminal `Err` item is followed by the end of the stream.
#[pin_project]
pub struct ChunkStream {
    #[pin]
    inner: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>,
}

impl ChunkStream {
    /// Stream `reader` in reads of up to `chunk_size` bytes.
    ///
    /// Empty reads are never yielded; end of input ends the stream.
    pub fn bytes<R>(reader: R, chunk_size: usize, cancel: CancellationToken) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        let chunk_size = chunk_size.max(1);
        let inner = async_stream::stream! {
            let mut reader = Box::pin(reader);
            let mut buf = vec![0u8; chunk_size];
            loop {
                if cancel.is_cancelled() {
                    debug!("Byte stream cancelled");
                    yield Err(TransportError::Cancelled);
                    break;
                }
                let read = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    read = reader.read(&mut buf) => Some(read),
                };
                match read {
                    None => {
                        debug!("Byte stream cancelled during read");
                        yield Err(TransportError::Cancelled);
                        break;
                    }
                    Some(Ok(0)) => break,
                    Some(Ok(n)) => yield Ok(Bytes::copy_from_slice(&buf[..n])),
                    Some(Err(e)) => {
                        debug!(error = %e, "Byte stream read failed");
                        yield Err(TransportError::Io(e));
                        break;
                    }
                }
            }
        };
        Self {
            inner: Box::pin(inner),
        }
    }

    /// Stream `reader` line by line.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped. A final line without
    /// a terminator is still yielded.
    pub fn lines<R>(reader: R, cancel: CancellationToken) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        let inner = async_stream::stream! {
            let mut reader = BufReader::new(Box::pin(reader));
            let mut line = Vec::new();
            loop {
                if cancel.is_cancelled() {
                    debug!("Line stream cancelled");
                    yield Err(TransportError::Cancelled);
                    break;
                }
                line.clear();
                let read = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    read = reader.read_until(b'\n', &mut line) => Some(read),
                };
                match read {
                    None => {
                        debug!("Line stream cancelled during read");
                        yield Err(TransportError::Cancelled);
                        break;
                    }
                    Some(Ok(0)) => break,
                    Some(Ok(_)) => yield Ok(Bytes::copy_from_slice(trim_line_ending(&line))),
                    Some(Err(e)) => {
                        debug!(error = %e, "Line stream read failed");
                        yield Err(TransportError::Io(e));
                        break;
                    }
                }
            }
        };
        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for ChunkStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl std::fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream").finish_non_exhaustive()
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
