//! # ElevenLabs SDK
//!
//! Async Rust client for the ElevenLabs text-to-speech API:
//! - One-shot and streaming speech generation, with or without timestamps
//! - Realtime conversion of a text stream over WebSocket
//! - Voice listing, cloning and settings
//! - Automatic retries with exponential backoff and `Retry-After` support
//! - Cancellation of requests, streams and realtime sessions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use elevenlabs::{Client, ConvertRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("your-api-key")?;
//!
//!     let audio = client
//!         .text_to_speech()
//!         .convert(
//!             ConvertRequest::builder()
//!                 .text("Hello from Rust!")
//!                 .voice_id("21m00Tcm4TlvDq8ikWAM")
//!                 .build()?,
//!         )
//!         .await?;
//!
//!     elevenlabs::audio::save_audio(&audio, "hello.mp3").await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export commonly used types
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, Environment};
pub use error::{ApiErrorKind, Error, Result};
pub use realtime::RealtimeAudioStream;
pub use resources::{TextToSpeech, Voices};
pub use streaming::{AudioStream, TimestampStream};
pub use types::*;

// Module declarations
pub mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod realtime;
pub mod resources;
pub mod streaming;
pub mod types;

#[cfg(feature = "trace")]
#[cfg_attr(docsrs, doc(cfg(feature = "trace")))]
pub mod observability;

// Re-export key dependencies for convenience
pub use async_trait::async_trait;
pub use elevenlabs_core::RetryConfig;
pub use elevenlabs_transport::CancellationToken;

/// Prelude module for common imports
///
/// ```rust
/// use elevenlabs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AudioStream, CancellationToken, Client, ClientConfig, Error, RealtimeAudioStream, Result,
        TimestampStream,
        types::{
            ConvertRequest, OutputFormat, RealtimeRequest, StreamRequest, VoiceSettings,
        },
    };
}

/// SDK version, automatically updated from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod property_tests;
