#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core primitives for the ElevenLabs SDK crates.
//!
//! This crate holds the pieces of the client that carry no I/O:
//!
//! - **Retry configuration** via [`RetryConfig`] and its builder
//! - **Retry decisions** via [`should_retry`] and [`RetryPolicy::calculate_delay`]
//! - **Jitter sources** via the [`JitterSource`] trait, with a seedable
//!   implementation for deterministic tests
//!
//! # Examples
//!
//! ```rust
//! use elevenlabs_core::prelude::*;
//! use std::time::Duration;
//!
//! let config = RetryConfig::builder()
//!     .max_attempts(3)
//!     .initial_delay(Duration::from_millis(500))
//!     .jitter_factor(0.0)
//!     .build();
//!
//! let policy = RetryPolicy::new(config);
//! assert!(should_retry(503));
//! assert_eq!(policy.calculate_delay(1, None), Duration::from_secs(1));
//! assert_eq!(policy.calculate_delay(1, Some("5")), Duration::from_secs(5));
//! ```

pub mod retry;

pub use retry::{
    JitterSource, RetryConfig, RetryConfigBuilder, RetryPolicy, SeededJitter, ThreadRngJitter,
    should_retry,
};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use elevenlabs_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::retry::{
        JitterSource, MAX_RETRY_AFTER, RetryConfig, RetryConfigBuilder, RetryPolicy,
        SeededJitter, ThreadRngJitter, parse_retry_after, should_retry,
    };
}
