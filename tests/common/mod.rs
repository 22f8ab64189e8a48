//! Common test utilities for docviz-client integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;

use docviz_client::{Config, PollConfig};
use std::time::Duration;

/// Configuration pointing at a mock server, polling every few milliseconds
#[allow(dead_code)]
pub fn fast_config(base_url: impl Into<String>, max_attempts: u32) -> Config {
    Config {
        poll: PollConfig {
            interval: Duration::from_millis(5),
            max_attempts,
            request_timeout: Some(Duration::from_secs(5)),
        },
        ..Config::with_base_url(base_url)
    }
}
