//! Sampler port - interface for content-generation backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Draft, SamplerOutput};

/// Trait for sampler implementations.
///
/// A sampler turns a draft into a candidate sample plus a short essence.
/// Implementations may be slow and non-deterministic (LLM calls, heuristics).
///
/// Samplers run inside a spawned task that may be aborted at any await point,
/// so they must not leave partial side effects behind: nothing is persisted
/// before commit.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Get the sampler name.
    fn name(&self) -> &'static str;

    /// Produce a sample for the draft.
    ///
    /// Timeout-class failures should be reported as
    /// [`GlimpseError::SamplerTimeout`](crate::domain::errors::GlimpseError::SamplerTimeout)
    /// so the performance layer can substitute its fallback.
    async fn sample(&self, draft: Draft) -> DomainResult<SamplerOutput>;
}
