//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::sync::Arc;
use std::time::Duration;

use glimpse::adapters::samplers::{MockResponse, MockSampler};
use glimpse::{Config, Draft, GlimpseEngine, LatencyConfig, SamplerOutput};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Config with latency thresholds divided by three (t4 = 2000 ms).
#[allow(dead_code)]
pub fn fast_config() -> Config {
    Config {
        latency: LatencyConfig::scaled_down(3),
        ..Config::default()
    }
}

/// Mock sampler that answers `output` after `delay`.
#[allow(dead_code)]
pub fn mock_after(delay: Duration, output: SamplerOutput) -> MockSampler {
    MockSampler::with_default_response(MockResponse::success(output).after(delay))
}

/// Engine around a mock that sleeps `delay` and answers aligned.
#[allow(dead_code)]
pub fn engine_with_delay(delay: Duration, config: &Config) -> (GlimpseEngine, Arc<MockSampler>) {
    let mock = Arc::new(mock_after(
        delay,
        SamplerOutput::aligned("generated sample", "generated essence"),
    ));
    let engine = GlimpseEngine::new(mock.clone(), config).expect("valid config");
    (engine, mock)
}

#[allow(dead_code)]
pub fn refactor_draft() -> Draft {
    Draft::new(
        "Refactor parse_event to handle None safely",
        "Safe None handling; preserve return schema",
        "Don't change the schema",
    )
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 10ms until it returns true or timeout is reached.
#[allow(dead_code)]
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
