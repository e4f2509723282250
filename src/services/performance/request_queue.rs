//! Bounded-concurrency request queue with priority draining.
//!
//! A counting semaphore caps in-flight sampler calls. Queued work is ordered
//! by priority (lower value first, then submission order) only among the
//! items present when [`RequestQueue::drain`] runs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{oneshot, Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::domain::models::QueueConfig;

struct Pending {
    priority: i32,
    seq: u64,
    job: BoxFuture<'static, ()>,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // BinaryHeap is a max-heap: invert so the lowest priority value pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct RequestQueue {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    pending: Mutex<BinaryHeap<Pending>>,
    seq: AtomicU64,
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("max_concurrent", &self.max_concurrent)
            .field("available", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

impl RequestQueue {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            pending: Mutex::new(BinaryHeap::new()),
            seq: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.max_concurrent)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Run `fut` directly under a concurrency permit.
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        // A closed semaphore only loses the bound, never the request.
        let _permit = self.semaphore.acquire().await.ok();
        fut.await
    }

    /// Queue `fut` for the next [`drain`](Self::drain).
    ///
    /// The receiver errors if the job panicked or was dropped unrun.
    pub async fn submit<F, T>(&self, priority: i32, fut: F) -> oneshot::Receiver<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = Box::pin(async move {
            let _ = tx.send(fut.await);
        });
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        self.pending.lock().await.push(Pending { priority, seq, job });
        rx
    }

    /// Start every queued job in priority order, at most `max_concurrent`
    /// at a time. Returns once the last job has been started.
    pub async fn drain(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        loop {
            let next = self.pending.lock().await.pop();
            let Some(pending) = next else {
                break;
            };
            let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
            tracing::trace!(priority = pending.priority, seq = pending.seq, "dispatching queued request");
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                pending.job.await;
            }));
        }
        handles
    }
}
