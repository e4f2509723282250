//! Clarifier decorator for any [`Sampler`].
//!
//! Runs blocking detection before the inner sampler. When a clarifier is
//! raised the inner sampler is never invoked.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Draft, SamplerOutput};
use crate::domain::ports::Sampler;

use super::ClarifierEngine;

pub struct ClarifiedSampler {
    inner: Arc<dyn Sampler>,
    clarifier: Arc<ClarifierEngine>,
}

impl ClarifiedSampler {
    pub fn new(inner: Arc<dyn Sampler>, clarifier: Arc<ClarifierEngine>) -> Self {
        Self { inner, clarifier }
    }
}

#[async_trait]
impl Sampler for ClarifiedSampler {
    fn name(&self) -> &'static str {
        "clarified"
    }

    async fn sample(&self, draft: Draft) -> DomainResult<SamplerOutput> {
        if let Some(delta) = self.clarifier.clarify(&draft) {
            return Ok(SamplerOutput::blocked(delta));
        }
        self.inner.sample(draft).await
    }
}
