//! Realtime text-to-speech from a stream of text chunks
//!
//! Text is fed sentence by sentence, as a chat model would produce it, and
//! audio is written to disk as soon as it arrives. Press Ctrl-C to stop.
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
//! cargo run --example realtime_tts --features full
//! ```

use std::time::Duration;

use elevenlabs::{CancellationToken, Client, OutputFormat, RealtimeRequest};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

const RACHEL: &str = "21m00Tcm4TlvDq8ikWAM";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    elevenlabs::observability::init_tracing();

    let client = Client::from_env()?;
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let sentences = [
        "Realtime synthesis starts speaking ",
        "before the whole text is known. ",
        "Each chunk is sent as soon as it is ready, ",
        "and audio comes back while we are still typing.",
    ];
    let text = futures::stream::iter(sentences).then(|sentence| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        println!("> {}", sentence);
        sentence.to_string()
    });

    let request = RealtimeRequest::builder()
        .voice_id(RACHEL)
        .model_id("eleven_flash_v2_5")
        .output_format(OutputFormat::Mp3_44100_128)
        .build()?;

    let mut audio = client
        .text_to_speech()
        .with_cancellation(cancel)
        .convert_realtime(request, text)
        .await?;

    let path = "realtime_tts.mp3";
    let mut file = tokio::fs::File::create(path).await?;
    let mut total = 0;
    while let Some(chunk) = audio.next().await {
        let chunk = chunk?;
        total += chunk.len();
        file.write_all(&chunk).await?;
        println!("< {} bytes of audio", chunk.len());
    }
    file.flush().await?;

    println!("Saved {} bytes to {}", total, path);
    Ok(())
}
