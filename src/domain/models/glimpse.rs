//! Glimpse result domain models.

use serde::{Deserialize, Serialize};

/// Shown once the first latency threshold is crossed.
pub fn trying_status(attempt: u32) -> String {
    format!("Trying, attempt {attempt}")
}
/// Shown once the second latency threshold is crossed.
pub const STATUS_CONFIRMING: &str = "Confirming intent match";
/// Shown once the third latency threshold is crossed.
pub const STATUS_CHOICES: &str =
    "Still working: keep waiting, redial, switch to essence-only, or commit?";
/// Shown once the degraded threshold is crossed.
pub const STATUS_DEGRADED: &str = "Degraded: network appears slow";

pub const STATUS_ALIGNED: &str = "Aligned. Ready to commit.";
pub const STATUS_NOT_ALIGNED: &str = "Not aligned yet. One adjustment suggested.";
pub const STATUS_STALE: &str = "Stale result (won't count). Re-glimpse?";
pub const STATUS_REDIAL: &str = "Clean reset. Same channel. Let's try again.";

pub const FALLBACK_ESSENCE: &str =
    "Request processing delayed due to high latency. Please try again.";
pub const FALLBACK_HISTORY: [&str; 2] = ["High latency detected", "Using fallback response"];
pub const FAILED_ESSENCE: &str = "Sampler failed.";

/// Externally visible outcome of a glimpse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlimpseStatus {
    Aligned,
    NotAligned,
    Redial,
    Stale,
    Error,
}

impl GlimpseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aligned => "aligned",
            Self::NotAligned => "not_aligned",
            Self::Redial => "redial",
            Self::Stale => "stale",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for GlimpseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a sampler yields for one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerOutput {
    pub sample: String,
    pub essence: String,
    /// Conflict note, clarifier question or error note.
    pub delta: Option<String>,
    pub aligned: bool,
}

impl SamplerOutput {
    pub fn aligned(sample: impl Into<String>, essence: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            essence: essence.into(),
            delta: None,
            aligned: true,
        }
    }

    pub fn not_aligned(
        sample: impl Into<String>,
        essence: impl Into<String>,
        delta: impl Into<String>,
    ) -> Self {
        Self {
            sample: sample.into(),
            essence: essence.into(),
            delta: Some(delta.into()),
            aligned: false,
        }
    }

    /// Short-circuit output carrying only a clarifier question.
    pub fn blocked(delta: impl Into<String>) -> Self {
        Self {
            sample: String::new(),
            essence: String::new(),
            delta: Some(delta.into()),
            aligned: false,
        }
    }

    /// Content substituted when the sampler misses its deadline.
    pub fn fallback() -> Self {
        Self {
            sample: String::new(),
            essence: FALLBACK_ESSENCE.to_string(),
            delta: Some(FALLBACK_HISTORY.join("; ")),
            aligned: false,
        }
    }
}

/// Outcome of a single `glimpse()` call. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlimpseResult {
    pub sample: String,
    pub essence: String,
    pub delta: Option<String>,
    pub status: GlimpseStatus,
    pub attempt: u32,
    /// Every status message shown during the call, in order.
    pub status_history: Vec<String>,
    pub stale: bool,
    /// Non-blocking curiosity question, offered alongside the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
}

impl GlimpseResult {
    /// Result returned once the attempt budget is spent.
    pub fn redial(max_attempts: u32) -> Self {
        Self {
            sample: String::new(),
            essence: String::new(),
            delta: None,
            status: GlimpseStatus::Redial,
            attempt: max_attempts,
            status_history: vec![STATUS_REDIAL.to_string()],
            stale: false,
            follow_up: None,
        }
    }

    /// Result of a cancelled call: no decision was made.
    pub fn cancelled(attempt: u32, status_history: Vec<String>) -> Self {
        Self {
            sample: String::new(),
            essence: String::new(),
            delta: None,
            status: GlimpseStatus::NotAligned,
            attempt: attempt.max(1),
            status_history,
            stale: false,
            follow_up: None,
        }
    }

    /// Safe stand-in produced when the sampler exceeds its deadline.
    pub fn fallback() -> Self {
        Self {
            sample: String::new(),
            essence: FALLBACK_ESSENCE.to_string(),
            delta: None,
            status: GlimpseStatus::Stale,
            attempt: 1,
            status_history: FALLBACK_HISTORY.iter().map(|s| (*s).to_string()).collect(),
            stale: true,
            follow_up: None,
        }
    }

    /// Per-item failure inside a batch.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            sample: String::new(),
            essence: FAILED_ESSENCE.to_string(),
            delta: Some(error.to_string()),
            status: GlimpseStatus::Error,
            attempt: 1,
            status_history: vec![FAILED_ESSENCE.to_string()],
            stale: false,
            follow_up: None,
        }
    }

    /// Single-shot result assembled straight from sampler output.
    pub fn from_output(output: SamplerOutput, attempt: u32) -> Self {
        let (status, terminal) = if output.aligned {
            (GlimpseStatus::Aligned, STATUS_ALIGNED)
        } else {
            (GlimpseStatus::NotAligned, STATUS_NOT_ALIGNED)
        };
        Self {
            sample: output.sample,
            essence: output.essence,
            delta: output.delta,
            status,
            attempt,
            status_history: vec![terminal.to_string()],
            stale: false,
            follow_up: None,
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.status == GlimpseStatus::Aligned
    }
}

/// Append `message` unless it repeats the immediately preceding entry.
pub fn push_status(history: &mut Vec<String>, message: impl Into<String>) {
    let message = message.into();
    if history.last() != Some(&message) {
        history.push(message);
    }
}
