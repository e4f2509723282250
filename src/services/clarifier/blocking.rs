//! Pre-execution detection of high-risk or goal-less drafts.

use crate::domain::errors::DomainResult;
use crate::domain::models::clarifier::contains_term;
use crate::domain::models::{Clarifier, Draft};

use super::ClarifierStrategy;

/// Destructive verbs that require an explicit acknowledgement.
pub const RISK_MARKERS: [&str; 7] = [
    "delete",
    "remove",
    "cancel",
    "terminate",
    "drop",
    "purge",
    "wipe",
];

/// Constraint phrases that acknowledge any risk marker.
const ACKNOWLEDGEMENTS: [&str; 2] = ["confirmed", "irreversible ok"];

/// Raises at most one clarifier: a risk marker wins over an empty goal.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingDetector;

impl BlockingDetector {
    pub fn new() -> Self {
        Self
    }

    fn unacknowledged_marker(draft: &Draft) -> Option<&'static str> {
        if ACKNOWLEDGEMENTS
            .iter()
            .any(|ack| contains_term(&draft.constraints, ack))
        {
            return None;
        }
        RISK_MARKERS.into_iter().find(|marker| {
            contains_term(&draft.input_text, marker) && !contains_term(&draft.constraints, marker)
        })
    }

    fn risk_clarifier(marker: &str) -> Clarifier {
        Clarifier::new(
            format!("This request would {marker} something. How should it proceed?"),
            &["proceed", "dry run first", "abort"],
            "dry run first",
        )
    }

    fn goal_clarifier() -> Clarifier {
        Clarifier::new(
            "What outcome should this produce?",
            &["working change", "explanation", "plan only"],
            "plan only",
        )
    }
}

impl ClarifierStrategy for BlockingDetector {
    fn name(&self) -> &'static str {
        "blocking"
    }

    fn detect(&self, draft: &Draft) -> DomainResult<Vec<Clarifier>> {
        if let Some(marker) = Self::unacknowledged_marker(draft) {
            return Ok(vec![Self::risk_clarifier(marker)]);
        }
        if draft.has_empty_goal() {
            return Ok(vec![Self::goal_clarifier()]);
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(draft: &Draft) -> Vec<Clarifier> {
        BlockingDetector::new().detect(draft).unwrap()
    }

    #[test]
    fn test_risk_marker_blocks() {
        let found = detect(&Draft::new("Delete the staging table", "free space", ""));
        assert_eq!(found.len(), 1);
        assert!(found[0].question.contains("delete"));
    }

    #[test]
    fn test_marker_acknowledged_in_constraints() {
        let draft = Draft::new("Delete the staging table", "free space", "ok to delete staging");
        assert!(detect(&draft).is_empty());

        let draft = Draft::new("Purge old logs", "free space", "confirmed");
        assert!(detect(&draft).is_empty());
    }

    #[test]
    fn test_empty_goal_blocks() {
        let found = detect(&Draft::new("some input", "", ""));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].question, "What outcome should this produce?");
    }

    #[test]
    fn test_risk_takes_precedence_over_empty_goal() {
        let found = detect(&Draft::new("terminate the instance", "", ""));
        assert_eq!(found.len(), 1);
        assert!(found[0].question.contains("terminate"));
    }

    #[test]
    fn test_clean_draft_passes() {
        let draft = Draft::new(
            "Refactor parse_event to handle None safely",
            "Safe None handling; preserve return schema",
            "Don't change the schema",
        );
        assert!(detect(&draft).is_empty());
    }
}
