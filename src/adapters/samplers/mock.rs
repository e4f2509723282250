//! Mock sampler for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainResult, GlimpseError};
use crate::domain::models::{Draft, SamplerOutput};
use crate::domain::ports::Sampler;

/// What the mock does for one call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Respond(SamplerOutput),
    Fail(String),
    TimeOut,
    Panic,
}

/// Mock response configuration.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub behavior: MockBehavior,
    /// Simulated sampler latency
    pub delay: Duration,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            behavior: MockBehavior::Respond(SamplerOutput::aligned(
                "Mock sample.",
                "Mock essence.",
            )),
            delay: Duration::ZERO,
        }
    }
}

impl MockResponse {
    pub fn success(output: SamplerOutput) -> Self {
        Self {
            behavior: MockBehavior::Respond(output),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Fail(error.into()),
            ..Default::default()
        }
    }

    pub fn timeout() -> Self {
        Self {
            behavior: MockBehavior::TimeOut,
            ..Default::default()
        }
    }

    pub fn panic() -> Self {
        Self {
            behavior: MockBehavior::Panic,
            ..Default::default()
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Scriptable sampler. Responses can be overridden per `input_text`.
pub struct MockSampler {
    default_response: MockResponse,
    response_overrides: RwLock<HashMap<String, MockResponse>>,
    calls: Arc<AtomicUsize>,
}

impl MockSampler {
    pub fn new() -> Self {
        Self::with_default_response(MockResponse::default())
    }

    pub fn with_default_response(response: MockResponse) -> Self {
        Self {
            default_response: response,
            response_overrides: RwLock::new(HashMap::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay every default response by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_response.delay = delay;
        self
    }

    pub fn with_response_for(mut self, input_text: &str, response: MockResponse) -> Self {
        self.response_overrides
            .get_mut()
            .insert(input_text.to_string(), response);
        self
    }

    pub fn failing_on(self, input_text: &str) -> Self {
        let response = MockResponse::failure(format!("mock failure for '{input_text}'"));
        self.with_response_for(input_text, response)
    }

    pub fn panicking_on(self, input_text: &str) -> Self {
        self.with_response_for(input_text, MockResponse::panic())
    }

    /// Set a specific response for an input while the mock is shared.
    pub async fn set_response_for(&self, input_text: &str, response: MockResponse) {
        let mut overrides = self.response_overrides.write().await;
        overrides.insert(input_text.to_string(), response);
    }

    async fn get_response(&self, input_text: &str) -> MockResponse {
        let overrides = self.response_overrides.read().await;
        overrides
            .get(input_text)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone())
    }

    /// Number of `sample` calls started so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sampler for MockSampler {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn sample(&self, draft: Draft) -> DomainResult<SamplerOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.get_response(&draft.input_text).await;

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        match response.behavior {
            MockBehavior::Respond(output) => Ok(output),
            MockBehavior::Fail(message) => Err(GlimpseError::SamplerFailed(message)),
            MockBehavior::TimeOut => Err(GlimpseError::SamplerTimeout(response.delay)),
            MockBehavior::Panic => panic!("mock sampler panic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_response() {
        let mock = MockSampler::new();
        let output = mock.sample(Draft::new("x", "y", "")).await.unwrap();
        assert!(output.aligned);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_override_by_input() {
        let mock = MockSampler::new().failing_on("bad");
        assert!(mock.sample(Draft::new("bad", "y", "")).await.is_err());
        assert!(mock.sample(Draft::new("good", "y", "")).await.is_ok());

        mock.set_response_for("good", MockResponse::timeout()).await;
        let err = mock.sample(Draft::new("good", "y", "")).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
