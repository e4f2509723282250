//! Lexical ambiguity detection and constraint mapping.
//!
//! The simple mode: a trigger word in the input flags a category (audience,
//! tone, length, ...) unless the constraints already pin it down. Answers are
//! folded back into the constraints as `category: value` tokens.

use crate::domain::errors::DomainResult;
use crate::domain::models::clarifier::contains_term;
use crate::domain::models::{AmbiguityCategory, Clarifier, Draft};

use super::ClarifierStrategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct AmbiguityDetector;

impl AmbiguityDetector {
    pub fn new() -> Self {
        Self
    }

    /// Categories triggered by the input and not yet settled by a constraint.
    pub fn categories(draft: &Draft) -> Vec<AmbiguityCategory> {
        AmbiguityCategory::ALL
            .into_iter()
            .filter(|category| {
                category
                    .triggers()
                    .iter()
                    .any(|t| contains_term(&draft.input_text, t))
            })
            .filter(|category| !is_settled(draft, *category))
            .collect()
    }
}

fn is_settled(draft: &Draft, category: AmbiguityCategory) -> bool {
    let prefix = format!("{}:", category.as_str());
    draft
        .constraint_list()
        .iter()
        .any(|c| c.to_lowercase().starts_with(&prefix))
}

impl ClarifierStrategy for AmbiguityDetector {
    fn name(&self) -> &'static str {
        "ambiguity"
    }

    fn detect(&self, draft: &Draft) -> DomainResult<Vec<Clarifier>> {
        Ok(Self::categories(draft)
            .into_iter()
            .map(|c| c.clarifier())
            .collect())
    }
}

/// Fold a response for `category` into `constraints`.
///
/// Unrecognized responses fall back to the category's declared default.
pub fn apply_response(constraints: &str, category: AmbiguityCategory, response: &str) -> String {
    let value = category.clarifier().resolve(response);
    let mut draft = Draft {
        constraints: constraints.to_string(),
        ..Draft::default()
    };
    draft.push_constraint(&format!("{}: {}", category.as_str(), value));
    draft.constraints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_detected() {
        let draft = Draft::new("Write a quick email summary", "update the team", "");
        let categories = AmbiguityDetector::categories(&draft);
        assert!(categories.contains(&AmbiguityCategory::Tone));
        assert!(categories.contains(&AmbiguityCategory::Length));
        assert!(!categories.contains(&AmbiguityCategory::Language));
    }

    #[test]
    fn test_settled_category_not_raised() {
        let draft = Draft::new("Write an email", "update the team", "tone: formal");
        let categories = AmbiguityDetector::categories(&draft);
        assert!(!categories.contains(&AmbiguityCategory::Tone));
    }

    #[test]
    fn test_apply_response_appends_token() {
        assert_eq!(
            apply_response("", AmbiguityCategory::Tone, "casual"),
            "tone: casual"
        );
        assert_eq!(
            apply_response("no emojis", AmbiguityCategory::Length, "long"),
            "no emojis | length: long"
        );
    }

    #[test]
    fn test_apply_response_falls_back_to_default() {
        assert_eq!(
            apply_response("", AmbiguityCategory::DetailLevel, "hmm"),
            "detail-level: high-level"
        );
        assert_eq!(
            apply_response("", AmbiguityCategory::Audience, "yes"),
            "audience: technical"
        );
    }
}
