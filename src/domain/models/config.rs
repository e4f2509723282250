use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Glimpse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Status escalation thresholds
    #[serde(default)]
    pub latency: LatencyConfig,

    /// Attempt budget and polling behavior
    #[serde(default)]
    pub engine: EngineConfig,

    /// Content-addressed result cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Adaptive sampler deadline
    #[serde(default)]
    pub timeout: TimeoutConfig,

    /// Concurrency bound for batched sampler calls
    #[serde(default)]
    pub queue: QueueConfig,

    /// Clarifier strategy selection
    #[serde(default)]
    pub clarifier: ClarifierConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Latency thresholds (milliseconds) that escalate the status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LatencyConfig {
    /// "Trying, attempt N"
    #[serde(default = "default_t1_ms")]
    pub t1_ms: u64,

    /// "Confirming intent match"
    #[serde(default = "default_t2_ms")]
    pub t2_ms: u64,

    /// Keep-waiting / redial / essence-only / commit choices
    #[serde(default = "default_t3_ms")]
    pub t3_ms: u64,

    /// Degraded network; results past this point are stale
    #[serde(default = "default_t4_ms")]
    pub t4_ms: u64,
}

const fn default_t1_ms() -> u64 {
    1500
}

const fn default_t2_ms() -> u64 {
    2500
}

const fn default_t3_ms() -> u64 {
    4000
}

const fn default_t4_ms() -> u64 {
    6000
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            t1_ms: default_t1_ms(),
            t2_ms: default_t2_ms(),
            t3_ms: default_t3_ms(),
            t4_ms: default_t4_ms(),
        }
    }
}

impl LatencyConfig {
    pub fn thresholds(&self) -> [Duration; 4] {
        [
            Duration::from_millis(self.t1_ms),
            Duration::from_millis(self.t2_ms),
            Duration::from_millis(self.t3_ms),
            Duration::from_millis(self.t4_ms),
        ]
    }

    pub fn is_monotonic(&self) -> bool {
        self.t1_ms <= self.t2_ms && self.t2_ms <= self.t3_ms && self.t3_ms <= self.t4_ms
    }

    /// Defaults divided by `factor`, for fast tests and demos.
    pub fn scaled_down(factor: u64) -> Self {
        let factor = factor.max(1);
        let d = Self::default();
        Self {
            t1_ms: d.t1_ms / factor,
            t2_ms: d.t2_ms / factor,
            t3_ms: d.t3_ms / factor,
            t4_ms: d.t4_ms / factor,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Attempts allowed before a redial is required
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause after a cancellation, coalescing rapid edits
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Poll loop tick
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Start in essence-only mode
    #[serde(default)]
    pub essence_only: bool,
}

const fn default_max_attempts() -> u32 {
    2
}

const fn default_debounce_ms() -> u64 {
    300
}

const fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            essence_only: false,
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Whether optimized calls consult and fill the cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum entries before LRU eviction
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,

    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_cache_max_size() -> usize {
    1000
}

const fn default_cache_ttl_seconds() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_size: default_cache_max_size(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    /// Larger, longer-lived cache for higher-traffic deployments.
    pub fn high_traffic() -> Self {
        Self {
            enabled: true,
            max_size: 2000,
            ttl_seconds: 7200,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Adaptive timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Bound used before any latency has been observed
    #[serde(default = "default_initial_timeout_secs")]
    pub initial_timeout_secs: f64,

    /// Hard ceiling for the bound
    #[serde(default = "default_max_timeout_secs")]
    pub max_timeout_secs: f64,

    /// Number of recent latencies considered
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

const fn default_initial_timeout_secs() -> f64 {
    2.0
}

const fn default_max_timeout_secs() -> f64 {
    10.0
}

const fn default_window_size() -> usize {
    10
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            initial_timeout_secs: default_initial_timeout_secs(),
            max_timeout_secs: default_max_timeout_secs(),
            window_size: default_window_size(),
        }
    }
}

/// Request queue configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Maximum in-flight sampler invocations
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

const fn default_max_concurrent() -> usize {
    4
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Clarifier strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClarifierConfig {
    /// Pre-execution detection of high-risk or goal-less drafts
    #[serde(default = "default_true")]
    pub blocking: bool,

    /// Post-execution, engagement-gated follow-up questions
    #[serde(default)]
    pub curiosity: bool,

    /// Lexical ambiguity categories (audience, tone, length, ...)
    #[serde(default)]
    pub legacy_ambiguity: bool,

    /// Minimum seconds between curiosity questions
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

const fn default_cooldown_secs() -> u64 {
    300
}

impl Default for ClarifierConfig {
    fn default() -> Self {
        Self {
            blocking: default_true(),
            curiosity: false,
            legacy_ambiguity: false,
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
