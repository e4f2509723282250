//! Latency-driven timeout bound.
//!
//! Keeps a rolling window of recent sampler latencies and sets the next
//! deadline to 1.5x their 95th percentile, capped at the configured maximum.

use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::models::TimeoutConfig;

const PERCENTILE: f64 = 0.95;
const HEADROOM: f64 = 1.5;

/// Value at index `floor(p * n)` of the sorted window.
///
/// `None` for an empty window or an index past the end (only when `p >= 1`).
pub fn percentile(window: &[f64], p: f64) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let mut sorted = window.to_vec();
    sorted.sort_by(f64::total_cmp);
    let index = (p * sorted.len() as f64).floor();
    if !(0.0..sorted.len() as f64).contains(&index) {
        return None;
    }
    sorted.get(index as usize).copied()
}

#[derive(Debug, Clone)]
pub struct AdaptiveTimeout {
    window: VecDeque<f64>,
    capacity: usize,
    current_secs: f64,
    max_secs: f64,
}

impl AdaptiveTimeout {
    pub fn new(config: TimeoutConfig) -> Self {
        let capacity = config.window_size.max(1);
        let max_secs = config.max_timeout_secs.max(0.0);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            current_secs: config.initial_timeout_secs.clamp(0.0, max_secs),
            max_secs,
        }
    }

    /// Deadline for the next sampler call.
    pub fn get_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.current_secs).unwrap_or(Duration::MAX)
    }

    pub fn record_latency(&mut self, latency: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(latency.as_secs_f64());

        let samples: Vec<f64> = self.window.iter().copied().collect();
        if let Some(p95) = percentile(&samples, PERCENTILE) {
            self.current_secs = (p95 * HEADROOM).clamp(0.0, self.max_secs);
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}
