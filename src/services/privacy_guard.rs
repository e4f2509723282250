//! Privacy guard.
//!
//! Intermediate glimpses are fully ephemeral: nothing is written, persisted or
//! sent anywhere until the caller commits. The guard owns the only path to a
//! side effect, the caller-supplied commit callback, and makes `commit` total
//! by swallowing callback errors and panics.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{Draft, GlimpseResult};

/// What the caller hands to `commit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Committable {
    Draft(Draft),
    Result(GlimpseResult),
}

impl From<Draft> for Committable {
    fn from(draft: Draft) -> Self {
        Self::Draft(draft)
    }
}

impl From<GlimpseResult> for Committable {
    fn from(result: GlimpseResult) -> Self {
        Self::Result(result)
    }
}

/// Callback invoked synchronously, exactly once per commit.
pub type CommitCallback = Arc<dyn Fn(&Committable) -> anyhow::Result<()> + Send + Sync>;

/// Acknowledgement returned from every commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub id: Uuid,
    pub committed_at: DateTime<Utc>,
    /// False when the callback returned an error or panicked.
    pub delivered: bool,
}

/// Gatekeeper for the commit side effect.
#[derive(Clone)]
pub struct PrivacyGuard {
    callback: Option<CommitCallback>,
    commits: Arc<AtomicU64>,
}

impl std::fmt::Debug for PrivacyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivacyGuard")
            .field("has_callback", &self.callback.is_some())
            .field("commits", &self.commit_count())
            .finish()
    }
}

impl Default for PrivacyGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivacyGuard {
    /// Guard with a no-op callback.
    pub fn new() -> Self {
        Self {
            callback: None,
            commits: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_callback<F>(callback: F) -> Self
    where
        F: Fn(&Committable) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(callback)),
            commits: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Invoke the callback once. Never fails and never panics.
    pub fn commit(&self, item: impl Into<Committable>) -> CommitReceipt {
        let item = item.into();
        let delivered = match &self.callback {
            None => true,
            Some(callback) => match catch_unwind(AssertUnwindSafe(|| callback(&item))) {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "commit callback failed");
                    false
                }
                Err(_) => {
                    tracing::warn!("commit callback panicked");
                    false
                }
            },
        };
        self.commits.fetch_add(1, Ordering::Relaxed);

        CommitReceipt {
            id: Uuid::new_v4(),
            committed_at: Utc::now(),
            delivered,
        }
    }

    /// Number of commits routed through this guard.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_default_guard_is_noop() {
        let guard = PrivacyGuard::new();
        let receipt = guard.commit(Draft::new("a", "b", ""));
        assert!(receipt.delivered);
        assert_eq!(guard.commit_count(), 1);
    }

    #[test]
    fn test_callback_invoked_exactly_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let guard = PrivacyGuard::with_callback(move |item| {
            sink.lock().unwrap().push(item.clone());
            Ok(())
        });

        let draft = Draft::new("ship it", "release", "");
        guard.commit(draft.clone());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], Committable::Draft(draft));
    }

    #[test]
    fn test_callback_error_is_swallowed() {
        let guard = PrivacyGuard::with_callback(|_| anyhow::bail!("disk full"));
        let receipt = guard.commit(Draft::default());
        assert!(!receipt.delivered);
        assert_eq!(guard.commit_count(), 1);
    }

    #[test]
    fn test_callback_panic_is_swallowed() {
        let guard = PrivacyGuard::with_callback(|_| panic!("boom"));
        let receipt = guard.commit(GlimpseResult::redial(2));
        assert!(!receipt.delivered);
    }
}
