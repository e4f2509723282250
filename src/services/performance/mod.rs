//! Performance layer in front of a sampler.

pub mod adaptive_timeout;
pub mod cache;
pub mod optimizer;
pub mod request_queue;

pub use adaptive_timeout::{percentile, AdaptiveTimeout};
pub use cache::{cache_key, draft_key, CacheStats, PerformanceCache};
pub use optimizer::{OptimizedSampler, OptimizerStats, PerformanceOptimizer};
pub use request_queue::RequestQueue;
