//! Offline sampler built from lexical rules.
//!
//! Flags a draft as not aligned when a constraint forbids something the
//! request asks for, or when no goal is given. Everything else is aligned and
//! answered with a short plan.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::clarifier::contains_term;
use crate::domain::models::{Draft, SamplerOutput};
use crate::domain::ports::Sampler;

/// `(constraint phrase, request phrase)` pairs that contradict each other.
const CONFLICTS: &[(&str, &str)] = &[
    ("no refactor", "refactor"),
    ("no new dependencies", "add dependency"),
    ("read-only", "write"),
    ("don't change the schema", "change the schema"),
];

#[derive(Debug, Clone, Default)]
pub struct HeuristicSampler {
    latency: Duration,
}

impl HeuristicSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a slow backend.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    fn conflict(draft: &Draft) -> Option<(&'static str, &'static str)> {
        let request = format!("{} {}", draft.input_text, draft.goal);
        CONFLICTS.iter().copied().find(|(constraint, asked)| {
            contains_term(&draft.constraints, constraint) && contains_term(&request, asked)
        })
    }

    fn plan(draft: &Draft) -> String {
        let constraints = draft.constraint_list();
        let constraints = if constraints.is_empty() {
            "none".to_string()
        } else {
            constraints.join("; ")
        };
        format!(
            "Plan for: {}\nGoal: {}\nConstraints: {}",
            draft.input_text.trim(),
            draft.goal.trim(),
            constraints
        )
    }

    fn evaluate(draft: &Draft) -> SamplerOutput {
        if let Some((constraint, asked)) = Self::conflict(draft) {
            return SamplerOutput::not_aligned(
                Self::plan(draft),
                format!("Request conflicts with '{constraint}'."),
                format!("Conflict: constraint '{constraint}' vs request to {asked}"),
            );
        }
        if draft.has_empty_goal() {
            return SamplerOutput::not_aligned(
                Self::plan(draft),
                "Input understood, but the intended outcome is unclear.",
                "Add a goal describing the outcome you want.",
            );
        }
        SamplerOutput::aligned(
            Self::plan(draft),
            format!("Understood: {}", draft.goal.trim()),
        )
    }
}

#[async_trait]
impl Sampler for HeuristicSampler {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn sample(&self, draft: Draft) -> DomainResult<SamplerOutput> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(Self::evaluate(&draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_preserving_refactor_is_aligned() {
        let output = HeuristicSampler::evaluate(&Draft::new(
            "Refactor parse_event to handle None safely",
            "Safe None handling; preserve return schema",
            "Don't change the schema",
        ));
        assert!(output.aligned);
        assert!(!output.essence.is_empty());
        assert!(output.delta.is_none());
    }

    #[test]
    fn test_conflicting_constraint() {
        let output = HeuristicSampler::evaluate(&Draft::new(
            "Refactor the parser",
            "cleaner code",
            "no refactor this sprint",
        ));
        assert!(!output.aligned);
        assert_eq!(
            output.delta.as_deref(),
            Some("Conflict: constraint 'no refactor' vs request to refactor")
        );
    }

    #[test]
    fn test_read_only_conflicts_with_write() {
        let output = HeuristicSampler::evaluate(&Draft::new(
            "Write the results to disk",
            "persist output",
            "read-only",
        ));
        assert!(!output.aligned);
    }

    #[test]
    fn test_empty_goal_not_aligned() {
        let output = HeuristicSampler::evaluate(&Draft::new("some input", "", ""));
        assert!(!output.aligned);
        assert!(!output.essence.is_empty());
    }
}
