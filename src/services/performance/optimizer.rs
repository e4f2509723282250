//! Cache, adaptive deadline and bounded concurrency around a sampler call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::errors::{DomainResult, GlimpseError};
use crate::domain::models::{Config, Draft, GlimpseResult, SamplerOutput};
use crate::domain::ports::Sampler;

use super::adaptive_timeout::AdaptiveTimeout;
use super::cache::{CacheStats, PerformanceCache};
use super::request_queue::RequestQueue;

/// How a single optimized call was satisfied.
enum Outcome {
    Cached(SamplerOutput),
    Fresh(SamplerOutput),
    TimedOut,
}

/// Snapshot of optimizer counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerStats {
    pub cache: CacheStats,
    pub current_timeout: Duration,
    pub timeouts: u64,
    pub failures: u64,
    pub sampler_calls: u64,
}

/// Composes [`PerformanceCache`], [`AdaptiveTimeout`] and [`RequestQueue`].
///
/// Cloning is cheap and every clone shares the same cache, timeout window
/// and queue.
#[derive(Clone)]
pub struct PerformanceOptimizer {
    cache: Arc<PerformanceCache<SamplerOutput>>,
    timeout: Arc<Mutex<AdaptiveTimeout>>,
    queue: Arc<RequestQueue>,
    cache_enabled: bool,
    timeouts: Arc<AtomicU64>,
    failures: Arc<AtomicU64>,
    sampler_calls: Arc<AtomicU64>,
}

impl std::fmt::Debug for PerformanceOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceOptimizer")
            .field("cache", &self.cache)
            .field("queue", &self.queue)
            .field("cache_enabled", &self.cache_enabled)
            .finish_non_exhaustive()
    }
}

impl PerformanceOptimizer {
    pub fn new(config: &Config) -> Self {
        Self {
            cache: Arc::new(PerformanceCache::from_config(&config.cache)),
            timeout: Arc::new(Mutex::new(AdaptiveTimeout::new(config.timeout))),
            queue: Arc::new(RequestQueue::from_config(&config.queue)),
            cache_enabled: config.cache.enabled,
            timeouts: Arc::new(AtomicU64::new(0)),
            failures: Arc::new(AtomicU64::new(0)),
            sampler_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// One optimizer meant to be handed to every caller in the process.
    pub fn shared(config: &Config) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn cache(&self) -> &PerformanceCache<SamplerOutput> {
        &self.cache
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub async fn current_timeout(&self) -> Duration {
        self.timeout.lock().await.get_timeout()
    }

    async fn run(
        &self,
        draft: &Draft,
        sampler: &Arc<dyn Sampler>,
        queued: bool,
    ) -> DomainResult<Outcome> {
        let started = Instant::now();

        if self.cache_enabled {
            if let Some(output) = self.cache.get(draft).await {
                let elapsed = started.elapsed();
                self.timeout.lock().await.record_latency(elapsed);
                tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "cache hit");
                return Ok(Outcome::Cached(output));
            }
        }

        let deadline = self.timeout.lock().await.get_timeout();
        self.sampler_calls.fetch_add(1, Ordering::Relaxed);
        // The deadline and latency sample start once a queue permit is held.
        let call = async {
            let called_at = Instant::now();
            let outcome = tokio::time::timeout(deadline, sampler.sample(draft.clone())).await;
            (outcome, called_at.elapsed())
        };
        let (outcome, elapsed) = if queued {
            self.queue.run(call).await
        } else {
            call.await
        };

        match outcome {
            Ok(Ok(output)) => {
                self.timeout.lock().await.record_latency(elapsed);
                if self.cache_enabled {
                    self.cache.set(draft, output.clone()).await;
                }
                tracing::debug!(
                    sampler = sampler.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    aligned = output.aligned,
                    "sampler completed"
                );
                Ok(Outcome::Fresh(output))
            }
            Ok(Err(e)) if e.is_timeout() => Ok(self.timed_out(sampler, deadline)),
            Err(_) => Ok(self.timed_out(sampler, deadline)),
            Ok(Err(e)) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(sampler = sampler.name(), error_kind = e.kind(), "sampler failed");
                Err(e)
            }
        }
    }

    fn timed_out(&self, sampler: &Arc<dyn Sampler>, deadline: Duration) -> Outcome {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            sampler = sampler.name(),
            deadline_ms = deadline.as_millis() as u64,
            "sampler exceeded deadline; using fallback"
        );
        Outcome::TimedOut
    }

    async fn glimpse_with(
        &self,
        draft: &Draft,
        sampler: &Arc<dyn Sampler>,
        queued: bool,
    ) -> DomainResult<(GlimpseResult, Duration)> {
        let started = Instant::now();
        let result = match self.run(draft, sampler, queued).await? {
            Outcome::Cached(output) | Outcome::Fresh(output) => {
                GlimpseResult::from_output(output, 1)
            }
            Outcome::TimedOut => GlimpseResult::fallback(),
        };
        Ok((result, started.elapsed()))
    }

    /// Cached, deadline-bounded sampler call.
    ///
    /// A missed deadline yields [`GlimpseResult::fallback`]. Other sampler
    /// errors are returned.
    pub async fn optimized_glimpse(
        &self,
        draft: &Draft,
        sampler: &Arc<dyn Sampler>,
    ) -> DomainResult<(GlimpseResult, Duration)> {
        self.glimpse_with(draft, sampler, true).await
    }

    /// Run every draft concurrently. Results come back in input order and a
    /// failing item never aborts its siblings.
    pub async fn batch_glimpses(
        &self,
        drafts: &[Draft],
        sampler: &Arc<dyn Sampler>,
    ) -> Vec<(GlimpseResult, Duration)> {
        let started = Instant::now();
        let handles = drafts.iter().cloned().map(|draft| {
            let optimizer = self.clone();
            let sampler = Arc::clone(sampler);
            tokio::spawn(async move {
                let item_started = Instant::now();
                optimizer
                    .optimized_glimpse(&draft, &sampler)
                    .await
                    .unwrap_or_else(|e| (GlimpseResult::failed(e), item_started.elapsed()))
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    (
                        GlimpseResult::failed(GlimpseError::from(e)),
                        started.elapsed(),
                    )
                })
            })
            .collect()
    }

    /// Like [`batch_glimpses`](Self::batch_glimpses), but dispatched through
    /// the queue so lower priority values start first.
    pub async fn batch_glimpses_prioritized(
        &self,
        items: Vec<(i32, Draft)>,
        sampler: &Arc<dyn Sampler>,
    ) -> Vec<(GlimpseResult, Duration)> {
        let started = Instant::now();
        let mut receivers = Vec::with_capacity(items.len());
        for (priority, draft) in items {
            let optimizer = self.clone();
            let sampler = Arc::clone(sampler);
            let rx = self
                .queue
                .submit(priority, async move {
                    let item_started = Instant::now();
                    optimizer
                        .glimpse_with(&draft, &sampler, false)
                        .await
                        .unwrap_or_else(|e| (GlimpseResult::failed(e), item_started.elapsed()))
                })
                .await;
            receivers.push(rx);
        }
        self.queue.drain().await;

        let mut results = Vec::with_capacity(receivers.len());
        for rx in receivers {
            results.push(rx.await.unwrap_or_else(|_| {
                self.failures.fetch_add(1, Ordering::Relaxed);
                (
                    GlimpseResult::failed(GlimpseError::SamplerAborted(
                        "request dropped before completion".to_string(),
                    )),
                    started.elapsed(),
                )
            }));
        }
        results
    }

    pub async fn stats(&self) -> OptimizerStats {
        OptimizerStats {
            cache: self.cache.stats().await,
            current_timeout: self.current_timeout().await,
            timeouts: self.timeouts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            sampler_calls: self.sampler_calls.load(Ordering::Relaxed),
        }
    }
}

/// [`Sampler`] decorator that routes calls through a [`PerformanceOptimizer`].
///
/// A missed deadline yields [`SamplerOutput::fallback`] instead of an error.
pub struct OptimizedSampler {
    inner: Arc<dyn Sampler>,
    optimizer: Arc<PerformanceOptimizer>,
}

impl OptimizedSampler {
    pub fn new(inner: Arc<dyn Sampler>, optimizer: Arc<PerformanceOptimizer>) -> Self {
        Self { inner, optimizer }
    }
}

#[async_trait]
impl Sampler for OptimizedSampler {
    fn name(&self) -> &'static str {
        "optimized"
    }

    async fn sample(&self, draft: Draft) -> DomainResult<SamplerOutput> {
        match self.optimizer.run(&draft, &self.inner, true).await? {
            Outcome::Cached(output) | Outcome::Fresh(output) => Ok(output),
            Outcome::TimedOut => Ok(SamplerOutput::fallback()),
        }
    }
}
