//! Text-to-speech endpoints

use std::sync::Arc;

use bytes::Bytes;
use elevenlabs_transport::{CancellationToken, DuplexSession, HttpRequest};
use futures::Stream;
use http::Method;
use tracing::{debug, info, warn};

use crate::{
    client::ApiContext,
    error::{Error, Result},
    realtime::{self, RealtimeAudioStream},
    streaming::{AudioStream, TimestampStream},
    types::{ConvertRequest, RealtimeRequest, StreamRequest, TimestampResponse},
};

/// Text-to-speech resource.
///
/// Obtained from [`Client::text_to_speech`](crate::Client::text_to_speech).
#[derive(Clone)]
pub struct TextToSpeech {
    api: Arc<ApiContext>,
    cancel: Option<CancellationToken>,
}

impl TextToSpeech {
    pub(crate) fn new(api: Arc<ApiContext>) -> Self {
        Self { api, cancel: None }
    }

    /// Return a copy whose calls stop when `token` is cancelled.
    ///
    /// Cancellation interrupts retry backoff, open streams and realtime
    /// conversions, surfacing [`Error::Cancelled`].
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cancel: Some(token),
        }
    }

    /// Convert text to audio in one request.
    ///
    /// Returns the complete audio in the requested output format
    /// (mp3 44.1 kHz 128 kbps unless set).
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use elevenlabs::{Client, ConvertRequest};
    /// # async fn example(client: Client) -> elevenlabs::Result<()> {
    /// let request = ConvertRequest::builder()
    ///     .text("Hello from Rust")
    ///     .voice_id("21m00Tcm4TlvDq8ikWAM")
    ///     .model_id("eleven_multilingual_v2")
    ///     .build()?;
    ///
    /// let audio = client.text_to_speech().convert(request).await?;
    /// elevenlabs::audio::save_audio(&audio, "hello.mp3").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self, request), fields(voice_id = %request.voice_id, chars = request.text.len()))]
    pub async fn convert(&self, request: ConvertRequest) -> Result<Bytes> {
        let http = self.prepare(&request, "", "audio/mpeg")?;
        let start = std::time::Instant::now();

        match self.api.send(http).await {
            Ok(response) => {
                info!(
                    elapsed_ms = start.elapsed().as_millis(),
                    bytes = response.body.len(),
                    "Speech generated"
                );
                Ok(response.body)
            }
            Err(e) => {
                warn!(elapsed_ms = start.elapsed().as_millis(), error = %e, "Speech generation failed");
                Err(e)
            }
        }
    }

    /// Convert text to audio with character-level timing.
    #[tracing::instrument(skip(self, request), fields(voice_id = %request.voice_id, chars = request.text.len()))]
    pub async fn convert_with_timestamps(&self, request: ConvertRequest) -> Result<TimestampResponse> {
        let http = self.prepare(&request, "/with-timestamps", "application/json")?;
        let parsed: TimestampResponse = self.api.send_json(http).await?;
        debug!(
            characters = parsed.alignment.as_ref().map_or(0, |a| a.characters.len()),
            "Timestamped speech generated"
        );
        Ok(parsed)
    }

    /// Stream audio as it is generated.
    ///
    /// The request is sent once; streaming requests are never retried.
    ///
    /// ```rust,no_run
    /// # use elevenlabs::{Client, StreamRequest};
    /// # use futures::StreamExt;
    /// # async fn example(client: Client) -> elevenlabs::Result<()> {
    /// let request = StreamRequest::builder()
    ///     .text("A longer passage read aloud")
    ///     .voice_id("21m00Tcm4TlvDq8ikWAM")
    ///     .build()?;
    ///
    /// let mut audio = client.text_to_speech().stream(request).await?;
    /// while let Some(chunk) = audio.next().await {
    ///     let chunk = chunk?;
    ///     println!("{} bytes", chunk.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self, request), fields(voice_id = %request.voice_id, chars = request.text.len()))]
    pub async fn stream(&self, request: StreamRequest) -> Result<AudioStream> {
        let http = self.prepare(&request, "/stream", "audio/mpeg")?;
        let response = self.api.stream(http).await?;
        debug!(status = response.status(), "Audio stream opened");
        Ok(AudioStream::new(response.into_default_chunks()))
    }

    /// Stream audio with timing, one [`TimestampChunk`](crate::TimestampChunk)
    /// per line of the response.
    #[tracing::instrument(skip(self, request), fields(voice_id = %request.voice_id, chars = request.text.len()))]
    pub async fn stream_with_timestamps(&self, request: StreamRequest) -> Result<TimestampStream> {
        let http = self.prepare(&request, "/stream-with-timestamps", "application/json")?;
        let response = self.api.stream(http).await?;
        debug!(status = response.status(), "Timestamp stream opened");
        Ok(TimestampStream::new(response.into_lines()))
    }

    /// Convert a stream of text to audio over one WebSocket connection.
    ///
    /// Text chunks are sent as they arrive; decoded audio is yielded as the
    /// server produces it. The conversion ends when the server marks the
    /// final chunk or closes the connection, on error, or on cancellation.
    ///
    /// ```rust,no_run
    /// # use elevenlabs::{Client, RealtimeRequest};
    /// # use futures::StreamExt;
    /// # async fn example(client: Client) -> elevenlabs::Result<()> {
    /// let request = RealtimeRequest::builder()
    ///     .voice_id("21m00Tcm4TlvDq8ikWAM")
    ///     .model_id("eleven_flash_v2_5")
    ///     .build()?;
    /// let text = futures::stream::iter(vec!["Hello ".to_string(), "world. ".to_string()]);
    ///
    /// let mut audio = client.text_to_speech().convert_realtime(request, text).await?;
    /// while let Some(chunk) = audio.next().await {
    ///     println!("{} bytes", chunk?.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self, request, text), fields(voice_id = %request.voice_id))]
    pub async fn convert_realtime<S>(
        &self,
        request: RealtimeRequest,
        text: S,
    ) -> Result<RealtimeAudioStream>
    where
        S: Stream<Item = String> + Send + 'static,
    {
        validate_voice_id(&request.voice_id)?;

        let session = self.api.session();
        let path = format!("v1/text-to-speech/{}/stream-input", request.voice_id);
        let mut url = url::Url::parse(&session.ws_url(&path))
            .map_err(|e| Error::InvalidUrl(format!("invalid realtime URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(model_id) = &request.model_id {
                query.append_pair("model_id", model_id);
            }
            if let Some(format) = request.output_format {
                query.append_pair("output_format", format.as_str());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let cancel = match &self.cancel {
            Some(token) => token.child_token(),
            None => CancellationToken::new(),
        };

        realtime::start(
            DuplexSession::from_session(session),
            url.as_str(),
            self.api.default_headers(),
            request.voice_settings.as_ref(),
            text,
            cancel,
        )
        .await
    }

    fn prepare(&self, request: &ConvertRequest, suffix: &str, accept: &str) -> Result<HttpRequest> {
        if request.text.trim().is_empty() {
            return Err(Error::InvalidRequest("text must not be empty".to_string()));
        }
        validate_voice_id(&request.voice_id)?;

        let path = format!("v1/text-to-speech/{}{}", request.voice_id, suffix);
        let mut http = request
            .apply_query(self.api.request(Method::POST, path))
            .with_header("Accept", accept)
            .with_json(request)?;
        if let Some(token) = &self.cancel {
            http = http.with_cancellation(token.clone());
        }
        Ok(http)
    }
}

pub(crate) fn validate_voice_id(voice_id: &str) -> Result<()> {
    if voice_id.trim().is_empty() {
        return Err(Error::InvalidRequest("voice_id must not be empty".to_string()));
    }
    if voice_id.contains('/') {
        return Err(Error::InvalidRequest(format!("invalid voice_id '{}'", voice_id)));
    }
    Ok(())
}

impl std::fmt::Debug for TextToSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextToSpeech")
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}
