//! Request and response types for the ElevenLabs API
//!
//! Optional fields are `Option<T>` and omitted from serialized bodies when
//! unset. Request types come with `derive_builder` builders.

pub mod text_to_speech;
pub mod voices;

pub use text_to_speech::*;
pub use voices::*;
