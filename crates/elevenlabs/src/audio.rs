//! Audio helpers: format sniffing, saving, local playback and upload checks.

use crate::error::{Error, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// File extensions accepted for voice sample uploads.
pub const SUPPORTED_UPLOAD_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "m4a", "ogg", "aac"];

/// Audio container or sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    /// MPEG layer III
    Mp3,
    /// RIFF/WAVE
    Wav,
    /// Raw 16-bit little-endian PCM
    Pcm,
    /// μ-law
    Ulaw,
}

impl AudioFormat {
    /// Lower-case name, also used as file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
            Self::Ulaw => "ulaw",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            "pcm" => Ok(Self::Pcm),
            "ulaw" | "mulaw" => Ok(Self::Ulaw),
            other => Err(Error::Audio(format!("unsupported audio format '{}'", other))),
        }
    }
}

/// Guess the format of an audio buffer from its first bytes.
///
/// An MPEG frame sync means mp3 and a `RIFF` header means wav. Anything
/// else, including buffers shorter than 4 bytes, is reported as raw PCM.
///
/// ```rust
/// use elevenlabs::audio::{AudioFormat, detect_audio_format};
///
/// assert_eq!(detect_audio_format(b"RIFF\x24\x00\x00\x00WAVE"), AudioFormat::Wav);
/// assert_eq!(detect_audio_format(&[0xFF, 0xFB, 0x90, 0x00]), AudioFormat::Mp3);
/// assert_eq!(detect_audio_format(b"abc"), AudioFormat::Pcm);
/// ```
pub fn detect_audio_format(data: &[u8]) -> AudioFormat {
    if data.len() < 4 {
        return AudioFormat::Pcm;
    }
    if data[0] == 0xFF && (data[1] & 0xE0) == 0xE0 {
        return AudioFormat::Mp3;
    }
    if &data[..4] == b"RIFF" {
        return AudioFormat::Wav;
    }
    AudioFormat::Pcm
}

/// Write audio to a file, replacing it if it exists.
pub async fn save_audio(audio: &[u8], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, audio).await?;
    debug!(path = %path.display(), bytes = audio.len(), "Audio saved");
    Ok(())
}

/// Copy audio from a reader to a writer, returning the number of bytes copied.
pub async fn copy_audio<R, W>(reader: &mut R, writer: &mut W) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    Ok(tokio::io::copy(reader, writer).await?)
}

/// Play audio through the platform's command-line player.
///
/// The audio is written to a temporary file that is removed afterwards.
/// Uses `afplay` on macOS, the first of `paplay`, `aplay` or `mpg123` found
/// on Linux, and PowerShell's `Media.SoundPlayer` on Windows.
pub async fn play_audio(audio: &[u8]) -> Result<()> {
    let suffix = format!(".{}", detect_audio_format(audio));
    let data = audio.to_vec();
    let file = tokio::task::spawn_blocking(move || -> std::io::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("elevenlabs_audio_")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&data)?;
        file.as_file().sync_all()?;
        Ok(file)
    })
    .await
    .map_err(|e| Error::Audio(format!("failed to prepare audio file: {}", e)))??;

    let result = play_file(file.path()).await;
    // Dropping the handle deletes the temporary file.
    drop(file);
    result
}

async fn play_file(path: &Path) -> Result<()> {
    let candidates = player_commands(path);
    if candidates.is_empty() {
        return Err(Error::Audio(format!(
            "unsupported operating system: {}",
            std::env::consts::OS
        )));
    }

    for (program, args) in candidates {
        match tokio::process::Command::new(program).args(&args).status().await {
            Ok(status) if status.success() => {
                debug!(player = program, "Audio played");
                return Ok(());
            }
            Ok(status) => {
                return Err(Error::Audio(format!("{} exited with {}", program, status)));
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(player = program, "Audio player not installed");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(Error::Audio("no suitable audio player found".to_string()))
}

fn player_commands(path: &Path) -> Vec<(&'static str, Vec<String>)> {
    let file = path.display().to_string();
    match std::env::consts::OS {
        "macos" => vec![("afplay", vec![file])],
        "linux" => vec![
            ("paplay", vec![file.clone()]),
            ("aplay", vec![file.clone()]),
            ("mpg123", vec![file]),
        ],
        "windows" => vec![(
            "powershell",
            vec![
                "-c".to_string(),
                format!("(New-Object Media.SoundPlayer '{}').PlaySync()", file),
            ],
        )],
        _ => Vec::new(),
    }
}

/// Check that a file exists and has a supported audio extension.
pub async fn validate_audio_file(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::Audio(format!("cannot read '{}': {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(Error::Audio(format!("'{}' is not a file", path.display())));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::Audio(format!(
            "unsupported audio file '{}' (expected one of: {})",
            path.display(),
            SUPPORTED_UPLOAD_EXTENSIONS.join(", ")
        )));
    }
    Ok(path.to_path_buf())
}

/// Size of a file in bytes.
pub async fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    Ok(tokio::fs::metadata(path).await?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(&[0xFF, 0xFB, 0x90, 0x64], AudioFormat::Mp3)]
    #[case(&[0xFF, 0xF3, 0x00, 0x00], AudioFormat::Mp3)]
    #[case(b"RIFF\x00\x00\x00\x00", AudioFormat::Wav)]
    #[case(&[0xFF, 0x00, 0x00, 0x00], AudioFormat::Pcm)]
    #[case(&[0xFF, 0xFB], AudioFormat::Pcm)]
    #[case(b"", AudioFormat::Pcm)]
    #[case(b"OggS", AudioFormat::Pcm)]
    fn test_detect_audio_format(#[case] data: &[u8], #[case] expected: AudioFormat) {
        assert_eq!(detect_audio_format(data), expected);
    }

    #[test]
    fn test_audio_format_parse() {
        assert_eq!("MP3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("mulaw".parse::<AudioFormat>().unwrap(), AudioFormat::Ulaw);
        assert_matches!("flac".parse::<AudioFormat>(), Err(Error::Audio(_)));
        assert_eq!(AudioFormat::Wav.to_string(), "wav");
    }

    #[tokio::test]
    async fn test_save_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp3");

        save_audio(b"AUDIODATA", &path).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"AUDIODATA");
        assert_eq!(file_size(&path).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_copy_audio() {
        let mut reader: &[u8] = b"chunked audio";
        let mut writer = Vec::new();

        let copied = copy_audio(&mut reader, &mut writer).await.unwrap();
        assert_eq!(copied, 13);
        assert_eq!(writer, b"chunked audio");
    }

    #[tokio::test]
    async fn test_validate_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("sample.WAV");
        let bad = dir.path().join("notes.txt");
        tokio::fs::write(&good, b"RIFF").await.unwrap();
        tokio::fs::write(&bad, b"text").await.unwrap();

        assert_eq!(validate_audio_file(&good).await.unwrap(), good);
        assert_matches!(validate_audio_file(&bad).await, Err(Error::Audio(_)));
        assert_matches!(
            validate_audio_file(dir.path().join("missing.mp3")).await,
            Err(Error::Audio(_))
        );
        assert_matches!(validate_audio_file(dir.path()).await, Err(Error::Audio(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_player_order() {
        let players: Vec<_> = player_commands(Path::new("/tmp/a.mp3"))
            .into_iter()
            .map(|(program, _)| program)
            .collect();
        assert_eq!(players, vec!["paplay", "aplay", "mpg123"]);
    }
}
