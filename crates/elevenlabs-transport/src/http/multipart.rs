//! `multipart/form-data` request bodies.
//!
//! A [`MultipartForm`] is a plain, cloneable description of the form. The
//! reqwest form is rebuilt from it for each attempt, since a sent form
//! cannot be replayed.

use crate::error::{Result, TransportError};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// Fallback MIME type for unknown extensions.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// MIME type for a file extension (without the dot, case-insensitive).
///
/// ```rust
/// use elevenlabs_transport::http::mime_type_for_extension;
///
/// assert_eq!(mime_type_for_extension("MP3"), "audio/mpeg");
/// assert_eq!(mime_type_for_extension("xyz"), "application/octet-stream");
/// ```
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        _ => DEFAULT_MIME_TYPE,
    }
}

/// MIME type for a path, based on its extension.
pub fn mime_type_for_path(path: impl AsRef<Path>) -> &'static str {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(DEFAULT_MIME_TYPE, mime_type_for_extension)
}

/// One file part of a multipart form.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Form field name
    pub field_name: String,
    /// File name reported to the server
    pub file_name: Option<String>,
    /// File content
    pub content: Bytes,
    /// MIME type of the content
    pub mime_type: String,
}

impl FileUpload {
    /// Build an upload from in-memory content, inferring the MIME type from
    /// the file name.
    pub fn from_bytes(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            field_name: field_name.into(),
            mime_type: mime_type_for_path(&file_name).to_string(),
            file_name: Some(file_name),
            content: content.into(),
        }
    }

    /// Read a file from disk into an upload.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub async fn from_path(field_name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Ok(Self {
            field_name: field_name.into(),
            file_name,
            content: Bytes::from(content),
            mime_type: mime_type_for_path(path).to_string(),
        })
    }

    /// Override the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    fn to_part(&self) -> Result<Part> {
        let mut part = Part::bytes(self.content.to_vec());
        if let Some(name) = &self.file_name {
            part = part.file_name(name.clone());
        }
        part.mime_str(&self.mime_type)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid MIME type '{}': {}", self.mime_type, e)))
    }
}

/// Text fields and file parts of a `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<FileUpload>,
}

impl MultipartForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a text field when a value is present.
    pub fn optional_text(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Add a file part.
    pub fn file(mut self, upload: FileUpload) -> Self {
        self.files.push(upload);
        self
    }

    /// Text fields in insertion order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// File parts in insertion order.
    pub fn files(&self) -> &[FileUpload] {
        &self.files
    }

    /// Build a fresh reqwest form.
    pub(crate) fn to_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for upload in &self.files {
            form = form.part(upload.field_name.clone(), upload.to_part()?);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("voice.mp3", "audio/mpeg")]
    #[case("voice.WAV", "audio/wav")]
    #[case("voice.flac", "audio/flac")]
    #[case("voice.m4a", "audio/mp4")]
    #[case("voice.ogg", "audio/ogg")]
    #[case("voice.aac", "audio/aac")]
    #[case("notes.txt", "text/plain")]
    #[case("doc.pdf", "application/pdf")]
    #[case("meta.json", "application/json")]
    #[case("archive.zip", "application/octet-stream")]
    #[case("no_extension", "application/octet-stream")]
    fn test_mime_table(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(mime_type_for_path(name), expected);
    }

    #[test]
    fn test_from_bytes() {
        let upload = FileUpload::from_bytes("files", "sample.wav", &b"RIFF"[..]);
        assert_eq!(upload.field_name, "files");
        assert_eq!(upload.file_name.as_deref(), Some("sample.wav"));
        assert_eq!(upload.mime_type, "audio/wav");
        assert_eq!(&upload.content[..], b"RIFF");
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        tokio::fs::write(&path, b"\xff\xfbdata").await.unwrap();

        let upload = FileUpload::from_path("files", &path).await.unwrap();
        assert_eq!(upload.file_name.as_deref(), Some("clip.mp3"));
        assert_eq!(upload.mime_type, "audio/mpeg");
        assert_eq!(upload.content.len(), 6);
    }

    #[tokio::test]
    async fn test_from_missing_path() {
        let result = FileUpload::from_path("files", "/definitely/not/here.wav").await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[test]
    fn test_form_builds_every_time() {
        let form = MultipartForm::new()
            .text("name", "My Voice")
            .optional_text("description", None::<String>)
            .file(FileUpload::from_bytes("files", "a.mp3", &b"abc"[..]));

        assert_eq!(form.fields().len(), 1);
        assert_eq!(form.files().len(), 1);
        assert!(form.to_form().is_ok());
        assert!(form.to_form().is_ok());
    }

    #[test]
    fn test_invalid_mime_rejected() {
        let form = MultipartForm::new()
            .file(FileUpload::from_bytes("files", "a.mp3", &b"abc"[..]).with_mime_type("not a mime"));
        assert!(matches!(form.to_form(), Err(TransportError::InvalidRequest(_))));
    }
}
