//! HTTP transport implementation
//!
//! Provides an HTTP client that implements the Transport trait.
//! Handles retries with backoff, cancellation and multipart uploads.

pub mod client;
pub mod multipart;
pub mod retry;

pub use client::HttpTransport;
pub use multipart::{FileUpload, MultipartForm, mime_type_for_extension, mime_type_for_path};
