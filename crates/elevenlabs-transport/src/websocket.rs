//! Duplex WebSocket session.
//!
//! A [`DuplexSession`] owns at most one live connection. Its state sits
//! behind a single `RwLock`: `connect` and `close` take the write lock,
//! while sends and receives briefly take the read lock to clone the
//! connection handle and then release it before doing any I/O. A receive
//! that is waiting for the next frame therefore never blocks a send or a
//! close; `close` wakes pending receives through the connection's close
//! token.

use crate::error::{Result, TransportError};
use crate::session::{API_KEY_HEADER, DEFAULT_HANDSHAKE_TIMEOUT, TransportSession, header_value};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use http::HeaderName;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Connection {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    closed: CancellationToken,
}

enum SessionState {
    Disconnected,
    Connected(Arc<Connection>),
}

/// A thread-safe, bidirectional WebSocket session.
///
/// Lifecycle: unconnected → connected ([`connect`](Self::connect)) →
/// closed ([`close`](Self::close)). Sending or receiving while not connected
/// fails with [`TransportError::NotConnected`] without touching the network.
/// A closed session may be connected again.
pub struct DuplexSession {
    api_key: SecretString,
    user_agent: Option<String>,
    handshake_timeout: Duration,
    state: RwLock<SessionState>,
}

impl DuplexSession {
    /// Create an unconnected session that authenticates with `api_key`.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            user_agent: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            state: RwLock::new(SessionState::Disconnected),
        }
    }

    /// Create an unconnected session from client settings.
    pub fn from_session(session: &TransportSession) -> Self {
        Self::new(session.api_key().clone())
            .with_user_agent(session.user_agent())
            .with_handshake_timeout(session.handshake_timeout())
    }

    /// Set the `User-Agent` sent on the handshake.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Bound the opening handshake.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Whether a connection is currently held.
    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.read().await, SessionState::Connected(_))
    }

    /// Open the connection.
    ///
    /// Does nothing if already connected. On failure the session stays
    /// unconnected.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidRequest`] for a malformed URL or header
    /// - [`TransportError::Timeout`] if the handshake exceeds the timeout
    /// - [`TransportError::Cancelled`] if `cancel` fires first
    /// - [`TransportError::WebSocket`] / [`TransportError::Io`] if the handshake fails
    pub async fn connect(
        &self,
        url: &str,
        headers: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if matches!(*state, SessionState::Connected(_)) {
            debug!(url = %url, "WebSocket already connected");
            return Ok(());
        }

        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(format!("invalid WebSocket URL: {}", e)))?;
        {
            let request_headers = request.headers_mut();
            request_headers.insert(
                HeaderName::from_static(API_KEY_HEADER),
                header_value(self.api_key.expose_secret())?,
            );
            if let Some(user_agent) = &self.user_agent {
                request_headers.insert(http::header::USER_AGENT, header_value(user_agent)?);
            }
            for (name, value) in headers {
                let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                    TransportError::InvalidRequest(format!("invalid header name '{}'", name))
                })?;
                request_headers.insert(name, header_value(value)?);
            }
        }

        info!(url = %url, "WebSocket connecting");
        let handshake = tokio::time::timeout(
            self.handshake_timeout,
            tokio_tungstenite::connect_async(request),
        );
        let (socket, _response) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = handshake => result.map_err(|_| TransportError::Timeout)??,
        };

        let (sink, stream) = socket.split();
        *state = SessionState::Connected(Arc::new(Connection {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: CancellationToken::new(),
        }));
        info!(url = %url, "WebSocket connected");
        Ok(())
    }

    async fn connection(&self) -> Result<Arc<Connection>> {
        match &*self.state.read().await {
            SessionState::Connected(connection) => Ok(Arc::clone(connection)),
            SessionState::Disconnected => Err(TransportError::NotConnected),
        }
    }

    async fn send_message(&self, message: Message) -> Result<()> {
        let connection = self.connection().await?;
        let mut sink = connection.sink.lock().await;
        sink.send(message).await.map_err(TransportError::from)
    }

    /// Serialize `value` as JSON and send it as a text frame.
    pub async fn send<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        // Check state before paying for serialization.
        self.connection().await?;
        let text = serde_json::to_string(value)?;
        self.send_text(text).await
    }

    /// Send a text frame.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_message(Message::Text(text.into())).await
    }

    /// Send a binary frame.
    pub async fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        self.send_message(Message::Binary(data.into())).await
    }

    /// Wait for the next data frame.
    ///
    /// Ping and pong frames are skipped. Returns `Ok(None)` once the peer
    /// closes the connection or the session is closed locally.
    pub async fn receive(&self) -> Result<Option<Bytes>> {
        let connection = self.connection().await?;
        let mut stream = connection.stream.lock().await;

        loop {
            let frame = tokio::select! {
                biased;
                _ = connection.closed.cancelled() => return Ok(None),
                frame = stream.next() => frame,
            };
            match frame {
                None => return Ok(None),
                Some(Err(err)) => return Err(err.into()),
                Some(Ok(Message::Text(text))) => return Ok(Some(Bytes::from(text))),
                Some(Ok(Message::Binary(data))) => return Ok(Some(Bytes::from(data))),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by peer");
                    return Ok(None);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            }
        }
    }

    /// Wait for the next data frame and decode it as JSON.
    pub async fn receive_json<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.receive().await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Close the connection.
    ///
    /// Idempotent: closing an unconnected session is a no-op.
    pub async fn close(&self) -> Result<()> {
        let connection = {
            let mut state = self.state.write().await;
            match std::mem::replace(&mut *state, SessionState::Disconnected) {
                SessionState::Connected(connection) => connection,
                SessionState::Disconnected => return Ok(()),
            }
        };

        connection.closed.cancel();
        let mut sink = connection.sink.lock().await;
        if let Err(err) = sink.send(Message::Close(None)).await {
            debug!(error = %err, "Close frame not delivered");
        }
        if let Err(err) = sink.close().await {
            warn!(error = %err, "WebSocket close failed");
        }
        info!("WebSocket closed");
        Ok(())
    }
}

impl std::fmt::Debug for DuplexSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplexSession")
            .field("handshake_timeout", &self.handshake_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DuplexSession {
        DuplexSession::new(SecretString::new("k".into()))
    }

    #[tokio::test]
    async fn test_send_before_connect_fails_fast() {
        let session = session();

        assert!(!session.is_connected().await);
        assert!(matches!(session.send_text("hi").await, Err(TransportError::NotConnected)));
        assert!(matches!(session.send_binary(vec![1u8]).await, Err(TransportError::NotConnected)));
        assert!(matches!(
            session.send(&serde_json::json!({"text": "hi"})).await,
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(session.receive().await, Err(TransportError::NotConnected)));
        assert!(matches!(
            session.receive_json::<serde_json::Value>().await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_close_unconnected_is_noop() {
        let session = session();
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_invalid_url_leaves_state_unchanged() {
        let session = session();
        let result = session
            .connect("not a url", &[], &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_cancelled_connect() {
        let session = session();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = session.connect("ws://127.0.0.1:9/socket", &[], &cancel).await;
        assert!(matches!(result, Err(TransportError::Cancelled)));
        assert!(!session.is_connected().await);
    }
}
