//! Convert text to speech, save it, and play it
//!
//! This example shows how to:
//! 1. Build a client from `ELEVENLABS_*` environment variables (or `.env`)
//! 2. Convert a sentence to mp3 audio
//! 3. Save the audio and detect its format
//! 4. Play it through the platform's audio player
//!
//! # Prerequisites
//!
//! ```bash
//! export ELEVENLABS_API_KEY=...
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --example basic_tts --features full
//! ```

use elevenlabs::audio::{detect_audio_format, play_audio, save_audio};
use elevenlabs::{Client, ConvertRequest, OutputFormat, VoiceSettings};

const RACHEL: &str = "21m00Tcm4TlvDq8ikWAM";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    elevenlabs::observability::init_tracing();

    let client = Client::from_env()?;

    let request = ConvertRequest::builder()
        .text("Hello! This audio was generated with the ElevenLabs Rust SDK.")
        .voice_id(RACHEL)
        .model_id("eleven_multilingual_v2")
        .output_format(OutputFormat::Mp3_44100_128)
        .voice_settings(
            VoiceSettings::builder()
                .stability(0.5)
                .similarity_boost(0.75)
                .build()?,
        )
        .build()?;

    println!("Generating speech...");
    let audio = client.text_to_speech().convert(request).await?;
    println!("Received {} bytes ({})", audio.len(), detect_audio_format(&audio));

    let path = "basic_tts.mp3";
    save_audio(&audio, path).await?;
    println!("Saved to {}", path);

    if let Err(e) = play_audio(&audio).await {
        eprintln!("Playback skipped: {}", e);
    }

    Ok(())
}
