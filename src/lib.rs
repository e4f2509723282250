//! Glimpse - preview-before-commit orchestration
//!
//! Glimpse runs a potentially slow, non-deterministic sampler in the
//! background, reports escalating progress while it waits, enforces a small
//! retry budget, and keeps every intermediate attempt ephemeral until the
//! caller explicitly commits.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): drafts, results, configuration, errors and
//!   the [`Sampler`](domain::ports::Sampler) port
//! - **Service Layer** (`services`): the glimpse engine, latency monitor,
//!   privacy guard, clarifier and performance layer
//! - **Adapters** (`adapters`): heuristic and mock samplers
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use glimpse::adapters::samplers::HeuristicSampler;
//! use glimpse::{Config, Draft, GlimpseEngine};
//!
//! # async fn run() -> Result<(), glimpse::GlimpseError> {
//! let mut engine = GlimpseEngine::new(Arc::new(HeuristicSampler::new()), &Config::default())?;
//! let draft = Draft::new("Refactor parse_event", "Safe None handling", "Don't change the schema");
//! let result = engine.glimpse(&draft).await?;
//! if result.is_aligned() {
//!     engine.commit(result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CacheConfig, ClarifierConfig, Config, Draft, EngineConfig, GlimpseResult, GlimpseStatus,
    LatencyConfig, LoggingConfig, QueueConfig, SamplerOutput, TimeoutConfig,
};
pub use domain::ports::Sampler;
pub use domain::{DomainResult, GlimpseError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    Canceller, ClarifierEngine, CommitReceipt, Committable, GlimpseEngine, PerformanceOptimizer,
    PrivacyGuard,
};
