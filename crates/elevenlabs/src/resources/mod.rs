//! API resource endpoints
//!
//! One type per API area, each obtained from [`Client`](crate::Client).

pub mod text_to_speech;
pub mod voices;

pub use text_to_speech::TextToSpeech;
pub use voices::Voices;
