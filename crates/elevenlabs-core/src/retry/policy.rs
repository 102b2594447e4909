//! Retry decisions and delay computation.

use super::config::RetryConfig;
use super::jitter::{JitterSource, ThreadRngJitter};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Largest server-provided `Retry-After` value that is honored verbatim.
///
/// Longer hints fall back to the computed backoff.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Whether a response with this HTTP status should be retried.
///
/// Retries server errors (`>= 500`), rate limiting (429), request timeouts
/// (408) and conflicts (409). Everything else is final.
///
/// ```rust
/// use elevenlabs_core::should_retry;
///
/// assert!(should_retry(429));
/// assert!(should_retry(502));
/// assert!(!should_retry(404));
/// ```
pub fn should_retry(status: u16) -> bool {
    status >= 500 || matches!(status, 408 | 409 | 429)
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// Returns `None` when the value is not a non-negative integer or exceeds
/// [`MAX_RETRY_AFTER`].
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<u64>().ok()?;
    let delay = Duration::from_secs(secs);
    (delay <= MAX_RETRY_AFTER).then_some(delay)
}

/// Computes backoff delays from a [`RetryConfig`] and a [`JitterSource`].
///
/// Cloning is cheap; the jitter source is shared.
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    jitter: Arc<dyn JitterSource>,
}

impl RetryPolicy {
    /// Create a policy using non-deterministic jitter.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_jitter(config, Arc::new(ThreadRngJitter))
    }

    /// Create a policy with an explicit jitter source.
    pub fn with_jitter(config: RetryConfig, jitter: Arc<dyn JitterSource>) -> Self {
        Self { config, jitter }
    }

    /// The configuration this policy was built from.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Number of retries after the first attempt.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts()
    }

    /// Delay to wait before retry number `attempt` (0-indexed).
    ///
    /// A `retry_after` hint that parses as whole seconds no greater than
    /// [`MAX_RETRY_AFTER`] is returned unchanged. Otherwise the exponential
    /// backoff is computed, capped at the configured maximum and jittered.
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<&str>) -> Duration {
        if let Some(delay) = retry_after.and_then(parse_retry_after) {
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Honoring Retry-After");
            return delay;
        }

        let capped = self.unjittered_delay(attempt).as_secs_f64();
        let jitter = self.config.jitter_factor();
        let delay = if jitter > 0.0 {
            let factor = 1.0 - jitter + 2.0 * jitter * self.jitter.sample();
            (capped * factor).max(0.0)
        } else {
            capped
        };

        let delay = Duration::try_from_secs_f64(delay).unwrap_or(self.config.max_delay());
        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Computed backoff");
        delay
    }

    /// The capped exponential delay for `attempt`, before jitter.
    ///
    /// This is the midpoint of the range [`calculate_delay`](Self::calculate_delay)
    /// samples from when no hint is given.
    pub fn unjittered_delay(&self, attempt: u32) -> Duration {
        let max = self.config.max_delay();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base =
            self.config.initial_delay().as_secs_f64() * self.config.backoff_multiplier().powi(exponent);

        if !base.is_finite() || base >= max.as_secs_f64() {
            return max;
        }
        Duration::try_from_secs_f64(base).unwrap_or(max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
