//! Glimpse engine.
//!
//! Runs a sampler in the background while a poll loop escalates status
//! messages from the [`LatencyMonitor`], enforces the attempt budget, and
//! honours cooperative cancellation. Nothing leaves the engine until
//! [`GlimpseEngine::commit`] hands it to the [`PrivacyGuard`].
//!
//! State machine: `READY(attempt = k)` for `k < max_attempts`, then `REDIAL`
//! until [`GlimpseEngine::commit`] or [`GlimpseEngine::reset`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{DomainResult, GlimpseError};
use crate::domain::models::glimpse::{
    push_status, STATUS_ALIGNED, STATUS_NOT_ALIGNED, STATUS_STALE,
};
use crate::domain::models::{
    Config, Draft, EngineConfig, GlimpseResult, GlimpseStatus, SamplerOutput,
};
use crate::domain::ports::Sampler;
use crate::services::clarifier::ClarifierEngine;
use crate::services::latency_monitor::LatencyMonitor;
use crate::services::privacy_guard::{Committable, CommitReceipt, PrivacyGuard};

type TokenSlot = Arc<Mutex<Option<CancellationToken>>>;

fn lock_slot(slot: &TokenSlot) -> MutexGuard<'_, Option<CancellationToken>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for cancelling the glimpse currently in flight on an engine.
///
/// Cancelling while nothing is in flight does nothing.
#[derive(Debug, Clone)]
pub struct Canceller {
    slot: TokenSlot,
}

impl Canceller {
    pub fn cancel(&self) {
        if let Some(token) = lock_slot(&self.slot).as_ref() {
            token.cancel();
        }
    }

    pub fn is_in_flight(&self) -> bool {
        lock_slot(&self.slot).is_some()
    }
}

/// Aborts the sampler task if the glimpse future is dropped early.
struct SamplerTask(JoinHandle<DomainResult<SamplerOutput>>);

impl Drop for SamplerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum Attempt {
    Completed(SamplerOutput, Vec<String>),
    Cancelled(Vec<String>),
}

pub struct GlimpseEngine {
    sampler: Arc<dyn Sampler>,
    monitor: LatencyMonitor,
    guard: PrivacyGuard,
    clarifier: Option<Arc<ClarifierEngine>>,
    config: EngineConfig,
    attempt: u32,
    essence_only: bool,
    in_flight: TokenSlot,
}

impl std::fmt::Debug for GlimpseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlimpseEngine")
            .field("sampler", &self.sampler.name())
            .field("attempt", &self.attempt)
            .field("max_attempts", &self.config.max_attempts)
            .field("essence_only", &self.essence_only)
            .finish_non_exhaustive()
    }
}

impl GlimpseEngine {
    /// Build an engine, failing fast on invalid latency or engine settings.
    pub fn new(sampler: Arc<dyn Sampler>, config: &Config) -> DomainResult<Self> {
        let engine = config.engine;
        if engine.max_attempts == 0 {
            return Err(GlimpseError::InvalidConfig(
                "engine.max_attempts must be at least 1".to_string(),
            ));
        }
        if engine.poll_interval_ms == 0 {
            return Err(GlimpseError::InvalidConfig(
                "engine.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            sampler,
            monitor: LatencyMonitor::new(config.latency)?,
            guard: PrivacyGuard::new(),
            clarifier: None,
            config: engine,
            attempt: 0,
            essence_only: engine.essence_only,
            in_flight: Arc::new(Mutex::new(None)),
        })
    }

    pub fn with_guard(mut self, guard: PrivacyGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_commit_callback<F>(self, callback: F) -> Self
    where
        F: Fn(&Committable) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_guard(PrivacyGuard::with_callback(callback))
    }

    /// Gate the sampler behind the clarifier and enable follow-up questions.
    pub fn with_clarifier(mut self, clarifier: Arc<ClarifierEngine>) -> Self {
        self.sampler = Arc::new(clarifier.wrap(Arc::clone(&self.sampler)));
        self.clarifier = Some(clarifier);
        self
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            slot: Arc::clone(&self.in_flight),
        }
    }

    /// Request cancellation of the in-flight glimpse, if any.
    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Takes effect on the next `glimpse()`.
    pub fn set_essence_only(&mut self, enabled: bool) {
        self.essence_only = enabled;
    }

    pub fn is_essence_only(&self) -> bool {
        self.essence_only
    }

    pub fn guard(&self) -> &PrivacyGuard {
        &self.guard
    }

    pub fn clarifier(&self) -> Option<&Arc<ClarifierEngine>> {
        self.clarifier.as_ref()
    }

    /// Run one attempt for `draft`.
    ///
    /// Cancellation, redial and staleness are reported in the result. Only a
    /// sampler failure is returned as an error, and it still uses up the
    /// attempt.
    pub async fn glimpse(&mut self, draft: &Draft) -> DomainResult<GlimpseResult> {
        let max = self.config.max_attempts;
        if self.attempt >= max {
            tracing::info!(attempt = self.attempt, max_attempts = max, "attempt budget spent");
            return Ok(GlimpseResult::redial(max));
        }

        self.attempt += 1;
        let attempt = self.attempt;
        let token = CancellationToken::new();
        *lock_slot(&self.in_flight) = Some(token.clone());
        self.monitor.start();
        tracing::debug!(attempt, sampler = self.sampler.name(), "glimpse started");

        let outcome = self.poll(draft, attempt, &token).await;
        *lock_slot(&self.in_flight) = None;

        match outcome {
            Ok(Attempt::Cancelled(history)) => {
                tokio::time::sleep(Duration::from_millis(self.config.debounce_ms)).await;
                self.attempt = self.attempt.saturating_sub(1);
                tracing::info!(
                    attempt,
                    elapsed_ms = self.monitor.elapsed_ms(),
                    "glimpse cancelled; attempt refunded"
                );
                Ok(GlimpseResult::cancelled(attempt, history))
            }
            Ok(Attempt::Completed(output, history)) => {
                Ok(self.finish(draft, attempt, output, history))
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    elapsed_ms = self.monitor.elapsed_ms(),
                    error_kind = e.kind(),
                    "sampler failed"
                );
                Err(e)
            }
        }
    }

    async fn poll(
        &self,
        draft: &Draft,
        attempt: u32,
        token: &CancellationToken,
    ) -> DomainResult<Attempt> {
        let sampler = Arc::clone(&self.sampler);
        let owned = draft.clone();
        let mut task = SamplerTask(tokio::spawn(async move { sampler.sample(owned).await }));

        let mut history = Vec::new();
        let mut shown = 0;
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    task.0.abort();
                    return Ok(Attempt::Cancelled(history));
                }
                joined = &mut task.0 => {
                    self.refresh_statuses(attempt, &mut history, &mut shown);
                    let output = joined??;
                    return Ok(Attempt::Completed(output, history));
                }
                _ = ticker.tick() => {
                    self.refresh_statuses(attempt, &mut history, &mut shown);
                }
            }
        }
    }

    /// Append statuses crossed since the last refresh.
    fn refresh_statuses(&self, attempt: u32, history: &mut Vec<String>, shown: &mut usize) {
        let crossed = self.monitor.statuses_for_elapsed(attempt);
        if crossed.len() > *shown {
            for message in &crossed[*shown..] {
                push_status(history, message.as_str());
            }
            *shown = crossed.len();
        }
    }

    fn finish(
        &self,
        draft: &Draft,
        attempt: u32,
        output: SamplerOutput,
        mut history: Vec<String>,
    ) -> GlimpseResult {
        let stale = self.monitor.mark_stale();
        let status = match (stale, output.aligned) {
            (true, _) => GlimpseStatus::Stale,
            (false, true) => GlimpseStatus::Aligned,
            (false, false) => GlimpseStatus::NotAligned,
        };
        push_status(
            &mut history,
            if output.aligned { STATUS_ALIGNED } else { STATUS_NOT_ALIGNED },
        );
        if stale {
            push_status(&mut history, STATUS_STALE);
        }

        // A clarifier block carries no essence; follow-ups only accompany real output.
        let follow_up = if output.essence.is_empty() {
            None
        } else {
            self.clarifier
                .as_ref()
                .and_then(|c| c.after_glimpse(draft))
                .map(|q| q.format())
        };

        tracing::info!(
            attempt,
            status = %status,
            stale,
            elapsed_ms = self.monitor.elapsed_ms(),
            essence_only = self.essence_only,
            "glimpse finished"
        );

        GlimpseResult {
            sample: if self.essence_only {
                String::new()
            } else {
                output.sample
            },
            essence: output.essence,
            delta: output.delta,
            status,
            attempt,
            status_history: history,
            stale,
            follow_up,
        }
    }

    /// Hand `item` to the privacy guard, then return to the initial state.
    pub fn commit(&mut self, item: impl Into<Committable>) -> CommitReceipt {
        let receipt = self.guard.commit(item);
        self.reset();
        receipt
    }

    /// Zero the attempt counter without committing anything.
    pub fn reset(&mut self) {
        self.attempt = 0;
        *lock_slot(&self.in_flight) = None;
    }
}
