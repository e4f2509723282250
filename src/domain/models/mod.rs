pub mod clarifier;
pub mod config;
pub mod draft;
pub mod glimpse;

pub use clarifier::{AmbiguityCategory, Clarifier, CuriosityQuestion, TaskType};
pub use config::{
    CacheConfig, ClarifierConfig, Config, EngineConfig, LatencyConfig, LoggingConfig, QueueConfig,
    TimeoutConfig,
};
pub use draft::Draft;
pub use glimpse::{GlimpseResult, GlimpseStatus, SamplerOutput};
