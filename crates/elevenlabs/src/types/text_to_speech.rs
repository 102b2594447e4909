//! Text-to-speech request and response types

use crate::error::Result;
use crate::types::VoiceSettings;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use derive_builder::Builder;
use elevenlabs_transport::HttpRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoding and sample rate of generated audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// MP3, 22.05 kHz, 32 kbps
    #[serde(rename = "mp3_22050_32")]
    Mp3_22050_32,
    /// MP3, 44.1 kHz, 32 kbps
    #[serde(rename = "mp3_44100_32")]
    Mp3_44100_32,
    /// MP3, 44.1 kHz, 64 kbps
    #[serde(rename = "mp3_44100_64")]
    Mp3_44100_64,
    /// MP3, 44.1 kHz, 96 kbps
    #[serde(rename = "mp3_44100_96")]
    Mp3_44100_96,
    /// MP3, 44.1 kHz, 128 kbps (server default)
    #[serde(rename = "mp3_44100_128")]
    Mp3_44100_128,
    /// MP3, 44.1 kHz, 192 kbps
    #[serde(rename = "mp3_44100_192")]
    Mp3_44100_192,
    /// Raw 16-bit PCM, 16 kHz
    #[serde(rename = "pcm_16000")]
    Pcm16000,
    /// Raw 16-bit PCM, 22.05 kHz
    #[serde(rename = "pcm_22050")]
    Pcm22050,
    /// Raw 16-bit PCM, 24 kHz
    #[serde(rename = "pcm_24000")]
    Pcm24000,
    /// Raw 16-bit PCM, 44.1 kHz
    #[serde(rename = "pcm_44100")]
    Pcm44100,
    /// μ-law, 8 kHz
    #[serde(rename = "ulaw_8000")]
    Ulaw8000,
}

impl OutputFormat {
    const ALL: [OutputFormat; 11] = [
        Self::Mp3_22050_32,
        Self::Mp3_44100_32,
        Self::Mp3_44100_64,
        Self::Mp3_44100_96,
        Self::Mp3_44100_128,
        Self::Mp3_44100_192,
        Self::Pcm16000,
        Self::Pcm22050,
        Self::Pcm24000,
        Self::Pcm44100,
        Self::Ulaw8000,
    ];

    /// Wire name, e.g. `mp3_44100_128`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3_22050_32 => "mp3_22050_32",
            Self::Mp3_44100_32 => "mp3_44100_32",
            Self::Mp3_44100_64 => "mp3_44100_64",
            Self::Mp3_44100_96 => "mp3_44100_96",
            Self::Mp3_44100_128 => "mp3_44100_128",
            Self::Mp3_44100_192 => "mp3_44100_192",
            Self::Pcm16000 => "pcm_16000",
            Self::Pcm22050 => "pcm_22050",
            Self::Pcm24000 => "pcm_24000",
            Self::Pcm44100 => "pcm_44100",
            Self::Ulaw8000 => "ulaw_8000",
        }
    }

    /// Container/codec family of this format.
    pub fn audio_format(&self) -> crate::audio::AudioFormat {
        use crate::audio::AudioFormat;
        match self {
            Self::Pcm16000 | Self::Pcm22050 | Self::Pcm24000 | Self::Pcm44100 => AudioFormat::Pcm,
            Self::Ulaw8000 => AudioFormat::Ulaw,
            _ => AudioFormat::Mp3,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidRequest(format!("unknown output format '{}'", s)))
    }
}

/// Text normalization mode (numbers, abbreviations, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextNormalization {
    /// Let the model decide
    Auto,
    /// Always normalize
    On,
    /// Never normalize
    Off,
}

/// Reference to a specific version of a pronunciation dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronunciationDictionaryVersionLocator {
    /// Dictionary identifier
    pub pronunciation_dictionary_id: String,
    /// Dictionary version identifier
    pub version_id: String,
}

impl PronunciationDictionaryVersionLocator {
    /// Create a locator.
    pub fn new(dictionary_id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            pronunciation_dictionary_id: dictionary_id.into(),
            version_id: version_id.into(),
        }
    }
}

/// Request parameters for converting text to speech.
///
/// `voice_id` goes into the URL path; `output_format`, `enable_logging` and
/// `optimize_streaming_latency` travel as query parameters. Everything else
/// is the JSON body, with unset fields omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option), build_fn(error = "crate::Error"))]
pub struct ConvertRequest {
    /// Text to synthesize
    pub text: String,

    /// Voice to speak with
    #[serde(skip)]
    pub voice_id: String,

    /// Model identifier, e.g. `eleven_multilingual_v2`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub model_id: Option<String>,

    /// ISO 639-1 language code, for models that support it
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub language_code: Option<String>,

    /// Overrides for the voice's stored settings
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub voice_settings: Option<VoiceSettings>,

    /// Pronunciation dictionaries to apply, in order (at most 3)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub pronunciation_dictionary_locators: Option<Vec<PronunciationDictionaryVersionLocator>>,

    /// Seed for best-effort deterministic sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub seed: Option<u32>,

    /// Text that came before this request, for prosody continuity
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub previous_text: Option<String>,

    /// Text that comes after this request, for prosody continuity
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub next_text: Option<String>,

    /// Request IDs of preceding generations
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub previous_request_ids: Option<Vec<String>>,

    /// Request IDs of following generations
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub next_request_ids: Option<Vec<String>>,

    /// Use the IVC version of a professional voice clone
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub use_pvc_as_ivc: Option<bool>,

    /// Text normalization mode
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub apply_text_normalization: Option<TextNormalization>,

    /// Language-specific normalization (currently Japanese only)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub apply_language_text_normalization: Option<bool>,

    /// Output encoding (query parameter)
    #[serde(skip)]
    #[builder(default)]
    pub output_format: Option<OutputFormat>,

    /// Set to `false` for zero-retention mode (query parameter)
    #[serde(skip)]
    #[builder(default)]
    pub enable_logging: Option<bool>,

    /// Latency optimization level 0 to 4 (query parameter)
    #[serde(skip)]
    #[builder(default)]
    pub optimize_streaming_latency: Option<u8>,
}

/// Request parameters for the streaming variants.
///
/// Streaming takes exactly the same parameters as a one-shot conversion.
pub type StreamRequest = ConvertRequest;

impl ConvertRequest {
    /// Create a builder for constructing a ConvertRequest.
    pub fn builder() -> ConvertRequestBuilder {
        ConvertRequestBuilder::default()
    }

    /// Attach the query-only parameters to an outgoing request.
    pub(crate) fn apply_query(&self, request: HttpRequest) -> HttpRequest {
        request
            .with_optional_query("output_format", self.output_format)
            .with_optional_query("enable_logging", self.enable_logging)
            .with_optional_query("optimize_streaming_latency", self.optimize_streaming_latency)
    }
}

/// Request parameters for a realtime (WebSocket) conversion.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into, strip_option), build_fn(error = "crate::Error"))]
pub struct RealtimeRequest {
    /// Voice to speak with
    pub voice_id: String,

    /// Model identifier (query parameter)
    #[builder(default)]
    pub model_id: Option<String>,

    /// Output encoding (query parameter)
    #[builder(default)]
    pub output_format: Option<OutputFormat>,

    /// Voice settings sent in the initialization message
    #[builder(default)]
    pub voice_settings: Option<VoiceSettings>,
}

impl RealtimeRequest {
    /// Create a builder for constructing a RealtimeRequest.
    pub fn builder() -> RealtimeRequestBuilder {
        RealtimeRequestBuilder::default()
    }
}

/// Character-level timing of generated audio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alignment {
    /// Characters in spoken order
    pub characters: Vec<String>,
    /// Start time of each character, in seconds
    pub character_start_times_seconds: Vec<f64>,
    /// End time of each character, in seconds
    pub character_end_times_seconds: Vec<f64>,
}

/// Audio plus alignment from the `with-timestamps` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampResponse {
    /// Base64-encoded audio
    #[serde(alias = "audio_base_64")]
    pub audio_base64: String,

    /// Alignment of the original text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    /// Alignment of the normalized text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_alignment: Option<Alignment>,
}

impl TimestampResponse {
    /// Decode the audio payload.
    pub fn audio(&self) -> Result<Bytes> {
        decode_audio(&self.audio_base64)
    }
}

/// One line of the `stream-with-timestamps` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampChunk {
    /// Base64-encoded audio of this chunk (may be empty)
    #[serde(default, alias = "audio_base_64")]
    pub audio_base64: String,

    /// Alignment of the text covered by this chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    /// Alignment of the normalized text covered by this chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_alignment: Option<Alignment>,

    /// Set on the last chunk when the server reports it
    #[serde(default)]
    pub is_final: bool,
}

impl TimestampChunk {
    /// Decode the audio payload.
    pub fn audio(&self) -> Result<Bytes> {
        decode_audio(&self.audio_base64)
    }
}

pub(crate) fn decode_audio(encoded: &str) -> Result<Bytes> {
    Ok(Bytes::from(STANDARD.decode(encoded)?))
}
