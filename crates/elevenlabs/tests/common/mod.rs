//! Common test utilities and helpers

use std::path::Path;

use elevenlabs::{Client, RetryConfig};
use std::time::Duration;

/// Load a response fixture
#[allow(dead_code)]
pub fn load_response_fixture(name: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(manifest_dir)
        .join("tests")
        .join("fixtures")
        .join("responses")
        .join(format!("{}.json", name));

    std::fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!(
            "Failed to load response fixture '{}' from {:?}: {}",
            name, path, e
        )
    })
}

/// Create a test API key
#[allow(dead_code)]
pub fn test_api_key() -> String {
    "k".to_string()
}

/// Client pointed at a mock server, with short backoff so retry tests stay fast
#[allow(dead_code)]
pub fn client_for(base_url: &str) -> Client {
    Client::builder()
        .api_key(test_api_key())
        .base_url(base_url)
        .retry(
            RetryConfig::builder()
                .max_attempts(3)
                .initial_delay(Duration::from_millis(10))
                .max_delay(Duration::from_millis(50))
                .jitter_factor(0.0)
                .build(),
        )
        .build()
        .expect("Failed to build client")
}
