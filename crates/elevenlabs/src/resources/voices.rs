//! Voices API endpoint

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use elevenlabs_transport::{FileUpload, MultipartForm};
use http::Method;
use tracing::{debug, info};

use super::text_to_speech::validate_voice_id;
use crate::{
    audio::validate_audio_file,
    client::ApiContext,
    error::{Error, Result},
    types::{
        AddVoiceRequest, AddVoiceResponse, EditVoiceRequest, GetAllOptions, GetOptions, Voice,
        VoiceSettings, VoicesResponse,
    },
};

/// Voices API resource.
///
/// Lists, inspects, clones and edits the voices available to the account.
#[derive(Clone)]
pub struct Voices {
    api: Arc<ApiContext>,
}

impl Voices {
    pub(crate) fn new(api: Arc<ApiContext>) -> Self {
        Self { api }
    }

    /// List all voices available to the account.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use elevenlabs::{Client, GetAllOptions};
    /// # async fn example(client: Client) -> elevenlabs::Result<()> {
    /// let voices = client.voices().get_all(GetAllOptions::default()).await?;
    /// for voice in voices.voices {
    ///     println!("{} {:?}", voice.voice_id, voice.name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self))]
    pub async fn get_all(&self, options: GetAllOptions) -> Result<VoicesResponse> {
        let request = self
            .api
            .request(Method::GET, "v1/voices")
            .with_optional_query("show_legacy", options.show_legacy);
        let voices: VoicesResponse = self.api.send_json(request).await?;
        debug!(count = voices.voices.len(), "Voices listed");
        Ok(voices)
    }

    /// Fetch one voice.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, voice_id: &str, options: GetOptions) -> Result<Voice> {
        validate_voice_id(voice_id)?;
        let request = self
            .api
            .request(Method::GET, format!("v1/voices/{}", voice_id))
            .with_optional_query("with_settings", options.with_settings);
        self.api.send_json(request).await
    }

    /// Delete a voice.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, voice_id: &str) -> Result<()> {
        validate_voice_id(voice_id)?;
        let request = self.api.request(Method::DELETE, format!("v1/voices/{}", voice_id));
        self.api.send(request).await?;
        info!(voice_id, "Voice deleted");
        Ok(())
    }

    /// Stored settings of a voice.
    #[tracing::instrument(skip(self))]
    pub async fn get_settings(&self, voice_id: &str) -> Result<VoiceSettings> {
        validate_voice_id(voice_id)?;
        let request = self
            .api
            .request(Method::GET, format!("v1/voices/{}/settings", voice_id));
        self.api.send_json(request).await
    }

    /// Replace the stored settings of a voice and return them.
    #[tracing::instrument(skip(self, settings))]
    pub async fn edit_settings(&self, voice_id: &str, settings: VoiceSettings) -> Result<VoiceSettings> {
        validate_voice_id(voice_id)?;
        let request = self
            .api
            .request(Method::POST, format!("v1/voices/{}/settings/edit", voice_id))
            .with_json(&settings)?;
        self.api.send(request).await?;
        debug!(voice_id, "Voice settings updated");
        Ok(settings)
    }

    /// Create an instant voice clone from local audio samples.
    ///
    /// Every file must exist and have a supported audio extension; see
    /// [`validate_audio_file`].
    ///
    /// ```rust,no_run
    /// # use elevenlabs::{AddVoiceRequest, Client};
    /// # async fn example(client: Client) -> elevenlabs::Result<()> {
    /// let request = AddVoiceRequest::builder()
    ///     .name("Narrator")
    ///     .files(vec!["sample1.mp3".into(), "sample2.mp3".into()])
    ///     .description("Warm, slow delivery")
    ///     .build()?;
    ///
    /// let created = client.voices().add(request).await?;
    /// println!("new voice {}", created.voice_id);
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self, request), fields(name = %request.name, files = request.files.len()))]
    pub async fn add(&self, request: AddVoiceRequest) -> Result<AddVoiceResponse> {
        if request.name.trim().is_empty() {
            return Err(Error::InvalidRequest("voice name must not be empty".to_string()));
        }
        if request.files.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one audio sample is required".to_string(),
            ));
        }

        let form = MultipartForm::new().text("name", request.name);
        let form = describe(
            form,
            request.description,
            request.labels,
            request.remove_background_noise,
        )?;
        let form = attach_files(form, &request.files).await?;

        let http = self
            .api
            .request(Method::POST, "v1/voices/add")
            .with_multipart(form);
        let created: AddVoiceResponse = self.api.send_json(http).await?;
        info!(voice_id = %created.voice_id, "Voice added");
        Ok(created)
    }

    /// Rename, relabel or add samples to an existing voice.
    #[tracing::instrument(skip(self, request), fields(files = request.files.len()))]
    pub async fn edit(&self, voice_id: &str, request: EditVoiceRequest) -> Result<()> {
        validate_voice_id(voice_id)?;

        let form = MultipartForm::new().optional_text("name", request.name);
        let form = describe(
            form,
            request.description,
            request.labels,
            request.remove_background_noise,
        )?;
        let form = attach_files(form, &request.files).await?;

        let http = self
            .api
            .request(Method::POST, format!("v1/voices/{}/edit", voice_id))
            .with_multipart(form);
        self.api.send(http).await?;
        info!(voice_id, "Voice edited");
        Ok(())
    }
}

fn describe(
    form: MultipartForm,
    description: Option<String>,
    labels: Option<HashMap<String, String>>,
    remove_background_noise: Option<bool>,
) -> Result<MultipartForm> {
    let labels = labels.map(|labels| serde_json::to_string(&labels)).transpose()?;
    Ok(form
        .optional_text("description", description)
        .optional_text("labels", labels)
        .optional_text(
            "remove_background_noise",
            remove_background_noise.map(|flag| flag.to_string()),
        ))
}

async fn attach_files(mut form: MultipartForm, files: &[PathBuf]) -> Result<MultipartForm> {
    for path in files {
        let path = validate_audio_file(path).await?;
        form = form.file(FileUpload::from_path("files", &path).await?);
    }
    Ok(form)
}

impl std::fmt::Debug for Voices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voices").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_encodes_labels_as_json() {
        let labels = HashMap::from([("accent".to_string(), "british".to_string())]);
        let form = describe(MultipartForm::new(), None, Some(labels), Some(true)).unwrap();

        assert_eq!(
            form.fields(),
            &[
                ("labels".to_string(), r#"{"accent":"british"}"#.to_string()),
                ("remove_background_noise".to_string(), "true".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_attach_files_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        tokio::fs::write(&notes, b"not audio").await.unwrap();

        let err = attach_files(MultipartForm::new(), &[notes]).await.unwrap_err();
        assert!(matches!(err, Error::Audio(_)));
    }

    #[tokio::test]
    async fn test_attach_files_reads_samples() {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("sample.mp3");
        tokio::fs::write(&sample, b"ID3").await.unwrap();

        let form = attach_files(MultipartForm::new(), &[sample]).await.unwrap();
        let files = form.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].field_name, "files");
        assert_eq!(files[0].file_name.as_deref(), Some("sample.mp3"));
        assert_eq!(files[0].mime_type, "audio/mpeg");
    }
}
