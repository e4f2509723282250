pub mod clarifier;
pub mod glimpse_engine;
pub mod latency_monitor;
pub mod performance;
pub mod privacy_guard;

pub use clarifier::{ClarifiedSampler, ClarifierEngine, ClarifierStrategy};
pub use glimpse_engine::{Canceller, GlimpseEngine};
pub use latency_monitor::LatencyMonitor;
pub use performance::{
    AdaptiveTimeout, OptimizedSampler, PerformanceCache, PerformanceOptimizer, RequestQueue,
};
pub use privacy_guard::{CommitReceipt, Committable, PrivacyGuard};
