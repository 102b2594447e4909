//! Retry configuration.

use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_MULTIPLIER: f64 = 2.0;
const DEFAULT_JITTER: f64 = 0.25;

/// Settings controlling how failed requests are retried.
///
/// A request is attempted at most `max_attempts + 1` times. The delay before
/// retry `n` (0-indexed) is derived from:
///
/// ```text
/// base_delay   = initial_delay * (backoff_multiplier ^ n)
/// capped_delay = min(base_delay, max_delay)
/// final_delay  = capped_delay * uniform(1 - jitter_factor, 1 + jitter_factor)
/// ```
///
/// The configuration is immutable once built and can be shared freely.
///
/// # Examples
///
/// ```rust
/// use elevenlabs_core::RetryConfig;
/// use std::time::Duration;
///
/// // Defaults: 3 retries, 500ms initial, 30s cap, x2.0, 25% jitter
/// let config = RetryConfig::default();
/// assert_eq!(config.max_attempts(), 3);
///
/// let config = RetryConfig::builder()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(10))
///     .backoff_multiplier(1.5)
///     .jitter_factor(0.1)
///     .build();
/// assert_eq!(config.max_delay(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
    jitter_factor: f64,
}

impl RetryConfig {
    /// Create a new builder for configuring retries.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// A configuration that performs exactly one attempt.
    pub fn no_retries() -> Self {
        Self::builder().max_attempts(0).build()
    }

    /// Number of retries after the first attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry, before jitter.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on the un-jittered delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Growth factor applied per retry. Always `>= 1.0`.
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Symmetric jitter fraction in `[0.0, 1.0]`.
    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    /// Return a copy with a different retry count.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_MULTIPLIER,
            jitter_factor: DEFAULT_JITTER,
        }
    }
}

/// Builder for [`RetryConfig`].
///
/// Out-of-range values are clamped rather than rejected: the multiplier is
/// raised to `1.0` and the jitter factor is clamped to `[0.0, 1.0]`.
#[derive(Debug, Default, Clone)]
pub struct RetryConfigBuilder {
    max_attempts: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    backoff_multiplier: Option<f64>,
    jitter_factor: Option<f64>,
}

impl RetryConfigBuilder {
    /// Set the number of retries after the first attempt.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the delay before the first retry.
    ///
    /// Default: 500ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the cap applied to the un-jittered delay.
    ///
    /// Default: 30s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the exponential multiplier.
    ///
    /// Default: 2.0
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        let multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            DEFAULT_MULTIPLIER
        };
        self.backoff_multiplier = Some(multiplier);
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A factor of 0.25 lets the delay vary by ±25%.
    ///
    /// Default: 0.25
    pub fn jitter_factor(mut self, jitter: f64) -> Self {
        let jitter = if jitter.is_nan() {
            0.0
        } else {
            jitter.clamp(0.0, 1.0)
        };
        self.jitter_factor = Some(jitter);
        self
    }

    /// Build the [`RetryConfig`], using defaults for unset values.
    pub fn build(self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            initial_delay: self.initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY),
            max_delay: self.max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(DEFAULT_MULTIPLIER),
            jitter_factor: self.jitter_factor.unwrap_or(DEFAULT_JITTER),
        }
    }
}
