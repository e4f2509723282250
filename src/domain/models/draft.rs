//! Draft domain model.

use serde::{Deserialize, Serialize};

/// The request a caller refines across attempts.
///
/// Drafts are owned and mutated by the caller; the engine only ever reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Draft {
    /// What the caller wants done.
    pub input_text: String,
    /// Desired outcome. An empty goal is an ambiguity signal.
    #[serde(default)]
    pub goal: String,
    /// Pipe-delimited free-text constraints.
    #[serde(default)]
    pub constraints: String,
}

impl Draft {
    pub fn new(
        input_text: impl Into<String>,
        goal: impl Into<String>,
        constraints: impl Into<String>,
    ) -> Self {
        Self {
            input_text: input_text.into(),
            goal: goal.into(),
            constraints: constraints.into(),
        }
    }

    /// Whether the goal carries no usable text.
    pub fn has_empty_goal(&self) -> bool {
        self.goal.trim().is_empty()
    }

    /// Individual constraints, split on `|`, trimmed, empties dropped.
    pub fn constraint_list(&self) -> Vec<&str> {
        self.constraints
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Append a `"category: value"` token to the constraints.
    pub fn push_constraint(&mut self, token: &str) {
        if self.constraints.trim().is_empty() {
            self.constraints = token.to_string();
        } else {
            self.constraints = format!("{} | {}", self.constraints.trim_end(), token);
        }
    }

    /// Normalized `(name, value)` pairs used to build content-addressed keys.
    ///
    /// Values are trimmed and inner whitespace is collapsed so that cosmetic
    /// edits hit the same cache entry.
    pub fn normalized_fields(&self) -> [(&'static str, String); 3] {
        [
            ("input_text", normalize(&self.input_text)),
            ("goal", normalize(&self.goal)),
            ("constraints", normalize(&self.constraints)),
        ]
    }
}

fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_list_skips_empty_segments() {
        let draft = Draft::new("x", "y", " a |  | b ");
        assert_eq!(draft.constraint_list(), vec!["a", "b"]);
    }

    #[test]
    fn test_push_constraint_on_empty_and_non_empty() {
        let mut draft = Draft::new("x", "y", "");
        draft.push_constraint("tone: formal");
        assert_eq!(draft.constraints, "tone: formal");

        draft.push_constraint("length: short");
        assert_eq!(draft.constraints, "tone: formal | length: short");
    }

    #[test]
    fn test_normalized_fields_collapse_whitespace() {
        let a = Draft::new("  fix   the bug ", "goal", "");
        let b = Draft::new("fix the bug", "goal", "");
        assert_eq!(a.normalized_fields(), b.normalized_fields());
    }

    #[test]
    fn test_empty_goal_detection() {
        assert!(Draft::new("x", "   ", "").has_empty_goal());
        assert!(!Draft::new("x", "ship it", "").has_empty_goal());
    }
}
