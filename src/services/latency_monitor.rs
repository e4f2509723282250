//! Latency monitor.
//!
//! Maps time elapsed since an operation started onto the ordered set of
//! user-facing status messages, and decides when a result has gone stale.

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::errors::{DomainResult, GlimpseError};
use crate::domain::models::glimpse::{
    trying_status, STATUS_CHOICES, STATUS_CONFIRMING, STATUS_DEGRADED,
};
use crate::domain::models::LatencyConfig;

/// Tracks elapsed time for one in-flight glimpse.
#[derive(Debug, Clone)]
pub struct LatencyMonitor {
    thresholds: [Duration; 4],
    started_at: Option<Instant>,
}

impl LatencyMonitor {
    /// Create a monitor, rejecting thresholds that are not non-decreasing.
    pub fn new(config: LatencyConfig) -> DomainResult<Self> {
        if !config.is_monotonic() {
            return Err(GlimpseError::InvalidConfig(format!(
                "latency thresholds must be non-decreasing, got {}/{}/{}/{} ms",
                config.t1_ms, config.t2_ms, config.t3_ms, config.t4_ms
            )));
        }
        Ok(Self {
            thresholds: config.thresholds(),
            started_at: None,
        })
    }

    /// Record the start time. Calling again simply restarts the clock.
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time since `start()`, zero if never started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Status messages whose thresholds have been crossed, in threshold order.
    pub fn statuses_for_elapsed(&self, attempt: u32) -> Vec<String> {
        if !self.is_started() {
            return Vec::new();
        }
        let elapsed = self.elapsed();
        let messages = [
            trying_status(attempt),
            STATUS_CONFIRMING.to_string(),
            STATUS_CHOICES.to_string(),
            STATUS_DEGRADED.to_string(),
        ];
        self.thresholds
            .iter()
            .zip(messages)
            .take_while(|(threshold, _)| elapsed >= **threshold)
            .map(|(_, message)| message)
            .collect()
    }

    /// Whether elapsed time has reached the degraded threshold.
    pub fn mark_stale(&self) -> bool {
        self.is_started() && self.elapsed() >= self.thresholds[3]
    }

    pub fn thresholds(&self) -> [Duration; 4] {
        self.thresholds
    }
}
