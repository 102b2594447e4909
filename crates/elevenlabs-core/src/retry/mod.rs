//! Retry configuration and backoff computation.
//!
//! # Key Types
//!
//! - [`RetryConfig`] - immutable retry settings
//! - [`RetryPolicy`] - computes delays from a config and a [`JitterSource`]
//! - [`should_retry`] - the fixed status-code retry predicate
//!
//! # Examples
//!
//! ```rust
//! use elevenlabs_core::retry::{RetryConfig, RetryPolicy, SeededJitter};
//! use std::sync::Arc;
//!
//! let policy = RetryPolicy::with_jitter(RetryConfig::default(), Arc::new(SeededJitter::new(7)));
//! let delay = policy.calculate_delay(0, None);
//! assert!(delay.as_millis() >= 375 && delay.as_millis() <= 625);
//! ```

mod config;
mod jitter;
mod policy;

pub use config::{RetryConfig, RetryConfigBuilder};
pub use jitter::{JitterSource, SeededJitter, ThreadRngJitter};
pub use policy::{MAX_RETRY_AFTER, RetryPolicy, parse_retry_after, should_retry};
