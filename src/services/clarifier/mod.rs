//! Clarifier engine.
//!
//! One engine, explicit strategies. Pre-execution strategies
//! ([`BlockingDetector`], [`AmbiguityDetector`]) can short-circuit the
//! sampler with a clarifier question; the post-execution
//! [`CuriosityDetector`] only ever adds a follow-up next to a finished result.
//!
//! Detection fails open: a strategy error is treated as "no clarifier" so the
//! sampler still runs.

pub mod ambiguity;
pub mod blocking;
pub mod curiosity;
pub mod sampler;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AmbiguityCategory, Clarifier, ClarifierConfig, CuriosityQuestion, Draft,
};
use crate::domain::ports::Sampler;

pub use ambiguity::{apply_response, AmbiguityDetector};
pub use blocking::BlockingDetector;
pub use curiosity::{CuriosityDetector, EngagementSnapshot};
pub use sampler::ClarifiedSampler;

/// A pre-execution detection strategy.
pub trait ClarifierStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Clarifiers this strategy would raise for the draft.
    fn detect(&self, draft: &Draft) -> DomainResult<Vec<Clarifier>>;
}

/// Composes the configured clarifier strategies.
pub struct ClarifierEngine {
    strategies: Vec<Box<dyn ClarifierStrategy>>,
    curiosity: Option<CuriosityDetector>,
}

impl std::fmt::Debug for ClarifierEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClarifierEngine")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("curiosity", &self.curiosity.is_some())
            .finish()
    }
}

impl ClarifierEngine {
    /// Build the strategy set selected by `config`.
    ///
    /// Blocking detection runs before ambiguity detection, so a blocking
    /// clarifier always wins.
    pub fn new(config: &ClarifierConfig) -> Self {
        let mut strategies: Vec<Box<dyn ClarifierStrategy>> = Vec::new();
        if config.blocking {
            strategies.push(Box::new(BlockingDetector::new()));
        }
        if config.legacy_ambiguity {
            strategies.push(Box::new(AmbiguityDetector::new()));
        }
        let curiosity = config
            .curiosity
            .then(|| CuriosityDetector::new(Duration::from_secs(config.cooldown_secs)));
        Self {
            strategies,
            curiosity,
        }
    }

    /// Engine with no strategies at all.
    pub fn disabled() -> Self {
        Self {
            strategies: Vec::new(),
            curiosity: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ClarifierStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Clarifiers from the first strategy that raises any.
    pub fn detect(&self, draft: &Draft) -> Vec<Clarifier> {
        for strategy in &self.strategies {
            match strategy.detect(draft) {
                Ok(found) if !found.is_empty() => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        count = found.len(),
                        "clarifier raised"
                    );
                    return found;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error_kind = e.kind(),
                        "clarifier detection failed; continuing"
                    );
                }
            }
        }
        Vec::new()
    }

    /// Formatted clarifier delta, if the draft must be clarified first.
    pub fn clarify(&self, draft: &Draft) -> Option<String> {
        Clarifier::format_all(&self.detect(draft))
    }

    /// Post-execution hook: maybe offer a follow-up, then count the interaction.
    pub fn after_glimpse(&self, draft: &Draft) -> Option<CuriosityQuestion> {
        let curiosity = self.curiosity.as_ref()?;
        let question = curiosity.suggest(draft);
        curiosity.record_interaction();
        question
    }

    pub fn record_response(&self, category: &str, value: &str) {
        if let Some(curiosity) = &self.curiosity {
            curiosity.record_response(category, value);
        }
    }

    pub fn record_silence(&self) {
        if let Some(curiosity) = &self.curiosity {
            curiosity.record_silence();
        }
    }

    pub fn preference(&self, category: &str) -> Option<String> {
        self.curiosity.as_ref()?.preference(category)
    }

    pub fn engagement(&self) -> Option<EngagementSnapshot> {
        self.curiosity.as_ref().map(CuriosityDetector::snapshot)
    }

    /// Fold an answer into a draft's constraints (legacy mapping mode).
    pub fn apply_answer(draft: &mut Draft, category: AmbiguityCategory, response: &str) {
        draft.constraints = apply_response(&draft.constraints, category, response);
    }

    /// Wrap a sampler so blocking clarifiers short-circuit it.
    pub fn wrap(self: &Arc<Self>, inner: Arc<dyn Sampler>) -> ClarifiedSampler {
        ClarifiedSampler::new(inner, Arc::clone(self))
    }
}
