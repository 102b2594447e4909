//! Voice library types

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Voice configuration used for synthesis.
///
/// All fields are optional; unset fields fall back to the voice's stored
/// settings on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option), default, build_fn(error = "crate::Error"))]
pub struct VoiceSettings {
    /// Stability, 0.0 to 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,

    /// Similarity boost, 0.0 to 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f64>,

    /// Style exaggeration, 0.0 to 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f64>,

    /// Boost similarity to the original speaker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,

    /// Speaking rate, 1.0 is normal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl VoiceSettings {
    /// Create a builder for constructing VoiceSettings.
    pub fn builder() -> VoiceSettingsBuilder {
        VoiceSettingsBuilder::default()
    }
}

/// A voice in the voice library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Voice {
    pub voice_id: String,
    pub name: Option<String>,
    pub samples: Option<Vec<Sample>>,
    pub category: Option<String>,
    pub labels: HashMap<String, String>,
    pub description: Option<String>,
    pub preview_url: Option<String>,
    pub available_for_tiers: Vec<String>,
    pub settings: Option<VoiceSettings>,
    pub sharing: Option<VoiceSharing>,
    pub high_quality_base_model_ids: Vec<String>,
    pub safety_control: Option<String>,
    pub voice_verification: Option<VoiceVerification>,
    pub permission_on_resource: Option<String>,
    pub is_legacy: Option<bool>,
    pub is_owner: Option<bool>,
}

/// An uploaded audio sample of a cloned voice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Sample {
    pub sample_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub hash: Option<String>,
}

/// Sharing state of a voice in the public library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct VoiceSharing {
    pub status: Option<String>,
    pub history_item_sample_id: Option<String>,
    pub original_voice_id: Option<String>,
    pub public_owner_id: Option<String>,
    pub liked_by_count: u64,
    pub cloned_by_count: u64,
    pub whitelisted_emails: Vec<String>,
    pub name: Option<String>,
    pub labels: HashMap<String, String>,
    pub description: Option<String>,
    pub review_status: Option<String>,
    pub review_message: Option<String>,
    pub enabled_in_library: bool,
    pub instant_cloning: bool,
    pub notice_period: Option<u64>,
    pub disable_logs: bool,
    pub voice_mixing_allowed: bool,
    pub featured: bool,
    pub category: Option<String>,
}

/// Verification state of a professional voice clone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct VoiceVerification {
    pub requires_verification: bool,
    pub is_verified: bool,
    pub verification_failures: Vec<String>,
    pub verification_attempts_count: u32,
    pub language: Option<String>,
}

/// Response of the voice list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoicesResponse {
    /// Voices available to the account
    #[serde(default)]
    pub voices: Vec<Voice>,
}

/// Options for listing voices.
#[derive(Debug, Clone, Default)]
pub struct GetAllOptions {
    /// Include legacy premade voices
    pub show_legacy: Option<bool>,
}

/// Options for fetching one voice.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Include the voice's stored settings
    pub with_settings: Option<bool>,
}

/// Request to create an instant voice clone from audio samples.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option), build_fn(error = "crate::Error"))]
pub struct AddVoiceRequest {
    /// Display name
    pub name: String,

    /// Audio sample files (mp3, wav, flac, m4a, ogg or aac)
    pub files: Vec<PathBuf>,

    /// Free-form description
    #[builder(default)]
    pub description: Option<String>,

    /// Labels such as accent or age
    #[builder(default)]
    pub labels: Option<HashMap<String, String>>,

    /// Remove background noise from the samples before cloning
    #[builder(default)]
    pub remove_background_noise: Option<bool>,
}

impl AddVoiceRequest {
    /// Create a builder for constructing an AddVoiceRequest.
    pub fn builder() -> AddVoiceRequestBuilder {
        AddVoiceRequestBuilder::default()
    }
}

/// Response of the add-voice endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddVoiceResponse {
    /// Identifier of the new voice
    pub voice_id: String,

    /// Whether the voice must be verified before use
    #[serde(default)]
    pub requires_verification: bool,
}

/// Request to rename, relabel or add samples to an existing voice.
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into, strip_option), default, build_fn(error = "crate::Error"))]
pub struct EditVoiceRequest {
    /// New display name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// Replacement labels
    pub labels: Option<HashMap<String, String>>,

    /// Additional audio samples
    pub files: Vec<PathBuf>,

    /// Remove background noise from new samples
    pub remove_background_noise: Option<bool>,
}

impl EditVoiceRequest {
    /// Create a builder for constructing an EditVoiceRequest.
    pub fn builder() -> EditVoiceRequestBuilder {
        EditVoiceRequestBuilder::default()
    }
}

/// Voice characteristics for generating a synthetic voice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option), default, build_fn(error = "crate::Error"))]
pub struct VoiceGenerationSettings {
    /// `female` or `male`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// `young`, `middle_aged` or `old`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    /// Accent such as `american` or `british`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,

    /// Accent strength, 0.3 to 2.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_strength: Option<f64>,
}

impl VoiceGenerationSettings {
    /// Create a builder for constructing VoiceGenerationSettings.
    pub fn builder() -> VoiceGenerationSettingsBuilder {
        VoiceGenerationSettingsBuilder::default()
    }
}
