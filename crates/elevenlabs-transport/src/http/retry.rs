//! Backoff helpers used by the HTTP retry loop.

use crate::error::{Result, TransportError};
use http::HeaderMap;
use http::header::RETRY_AFTER;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleep for `delay`, returning early with [`TransportError::Cancelled`]
/// if `cancel` fires first.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// The raw `Retry-After` value of a response, if present and valid ASCII.
pub fn retry_after_hint(headers: &HeaderMap) -> Option<String> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
