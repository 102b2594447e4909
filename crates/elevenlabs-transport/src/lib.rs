//! Transport layer for the ElevenLabs SDK
//!
//! Everything that touches the network lives here:
//!
//! - **HTTP transport**: [`HttpTransport`] sends requests with retry,
//!   exponential backoff and cancellation, and opens unretried streaming
//!   responses
//! - **Chunk streaming**: [`ChunkStream`] exposes a live body as byte chunks
//!   or lines
//! - **WebSocket sessions**: [`DuplexSession`] wraps one bidirectional
//!   connection with a guarded connect/close lifecycle
//! - **Multipart uploads**: [`MultipartForm`] and [`FileUpload`]
//!
//! # Usage
//!
//! ```no_run
//! use elevenlabs_transport::{HttpRequest, HttpTransport, Transport, TransportSession};
//! use secrecy::SecretString;
//!
//! # async fn example() -> elevenlabs_transport::Result<()> {
//! let session = TransportSession::new(
//!     SecretString::new("api-key".into()),
//!     "https://api.elevenlabs.io",
//!     "wss://api.elevenlabs.io",
//! );
//! let transport = HttpTransport::new(session)?;
//! let response = transport.send(HttpRequest::get("v1/voices")).await?;
//! println!("{}", response.status);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod session;
pub mod stream;
pub mod traits;
pub mod websocket;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use self::http::{FileUpload, HttpTransport, MultipartForm};
pub use session::{API_KEY_HEADER, TransportSession};
pub use stream::{ChunkStream, DEFAULT_CHUNK_SIZE};
pub use traits::{HttpRequest, HttpResponse, RequestBody, StreamingResponse, Transport};
pub use websocket::DuplexSession;

pub use tokio_util::sync::CancellationToken;
