//! Log output setup for binaries built on the SDK
//!
//! The SDK itself only emits `tracing` events. Applications that do not
//! install a subscriber of their own can call [`init_tracing`].

use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,elevenlabs=debug,elevenlabs_transport=debug";

/// Install a formatting subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`].
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_tracing_with(filter);
}

/// Install a formatting subscriber with an explicit filter.
pub fn init_tracing_with(filter: EnvFilter) {
    if fmt().with_env_filter(filter).with_target(true).try_init().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
