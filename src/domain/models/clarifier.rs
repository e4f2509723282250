//! Clarifier domain models.
//!
//! A clarifier is a structured question (options plus a default) raised when
//! a draft is ambiguous or high-risk. Blocking clarifiers short-circuit the
//! sampler; curiosity questions ride along with a finished result.

use serde::{Deserialize, Serialize};

/// Lexical ambiguity categories understood by the legacy mapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityCategory {
    Audience,
    Tone,
    Length,
    Format,
    Scope,
    Language,
    Urgency,
    DetailLevel,
}

impl AmbiguityCategory {
    pub const ALL: [Self; 8] = [
        Self::Audience,
        Self::Tone,
        Self::Length,
        Self::Format,
        Self::Scope,
        Self::Language,
        Self::Urgency,
        Self::DetailLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audience => "audience",
            Self::Tone => "tone",
            Self::Length => "length",
            Self::Format => "format",
            Self::Scope => "scope",
            Self::Language => "language",
            Self::Urgency => "urgency",
            Self::DetailLevel => "detail-level",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "audience" => Some(Self::Audience),
            "tone" => Some(Self::Tone),
            "length" => Some(Self::Length),
            "format" => Some(Self::Format),
            "scope" => Some(Self::Scope),
            "language" => Some(Self::Language),
            "urgency" => Some(Self::Urgency),
            "detail-level" | "detail" => Some(Self::DetailLevel),
            _ => None,
        }
    }

    /// Words in the input that suggest this dimension is underspecified.
    pub fn triggers(&self) -> &'static [&'static str] {
        match self {
            Self::Audience => &["explain", "present", "pitch", "announce"],
            Self::Tone => &["email", "message", "reply", "post"],
            Self::Length => &["summary", "summarize", "overview", "brief"],
            Self::Format => &["report", "list", "table", "document"],
            Self::Scope => &["all", "everything", "entire", "whole"],
            Self::Language => &["translate", "localize"],
            Self::Urgency => &["asap", "urgent", "quickly", "soon"],
            Self::DetailLevel => &["detailed", "details", "deep dive", "analyze"],
        }
    }

    /// The clarifier raised for this category.
    pub fn clarifier(&self) -> Clarifier {
        let (question, options, default): (&str, &[&str], &str) = match self {
            Self::Audience => (
                "Who is the audience?",
                &["technical", "non-technical", "executive"],
                "technical",
            ),
            Self::Tone => ("Which tone fits?", &["formal", "casual", "neutral"], "neutral"),
            Self::Length => ("How long should it be?", &["short", "medium", "long"], "short"),
            Self::Format => (
                "Which format?",
                &["bullet points", "prose", "table"],
                "bullet points",
            ),
            Self::Scope => ("How wide is the scope?", &["minimal", "full"], "minimal"),
            Self::Language => (
                "Which language?",
                &["english", "spanish", "french", "german"],
                "english",
            ),
            Self::Urgency => (
                "How urgent is this?",
                &["today", "this week", "no rush"],
                "this week",
            ),
            Self::DetailLevel => (
                "How much detail?",
                &["high-level", "detailed"],
                "high-level",
            ),
        };
        Clarifier::new(question, options, default).with_category(*self)
    }
}

impl std::fmt::Display for AmbiguityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured question with options and a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarifier {
    pub question: String,
    pub options: Vec<String>,
    pub default: String,
    /// Set for clarifiers that map onto a constraint token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<AmbiguityCategory>,
}

impl Clarifier {
    pub fn new(question: impl Into<String>, options: &[&str], default: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
            default: default.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: AmbiguityCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// `<question> [<opt1> | <opt2>] (default: <default>)`
    fn body(&self) -> String {
        format!(
            "{} [{}] (default: {})",
            self.question,
            self.options.join(" | "),
            self.default
        )
    }

    /// Render a single clarifier as a delta string.
    pub fn format(&self) -> String {
        format!("Clarifier: {}", self.body())
    }

    /// Render one or more clarifiers as a delta string.
    ///
    /// Returns `None` for an empty slice.
    pub fn format_all(clarifiers: &[Self]) -> Option<String> {
        match clarifiers {
            [] => None,
            [single] => Some(single.format()),
            many => {
                let mut lines = vec!["Clarifier: Please specify:".to_string()];
                for (i, c) in many.iter().enumerate() {
                    lines.push(format!("{}. {}", i + 1, c.body()));
                }
                Some(lines.join("\n"))
            }
        }
    }

    /// Resolve a caller response to one of the options.
    ///
    /// An exact option wins; `yes` picks the first option, `no` the second;
    /// anything else falls back to the declared default.
    pub fn resolve(&self, response: &str) -> String {
        let normalized = response.trim().to_lowercase();
        if let Some(option) = self.options.iter().find(|o| o.to_lowercase() == normalized) {
            return option.clone();
        }
        match normalized.as_str() {
            "yes" | "y" => self.options.first().cloned().unwrap_or_else(|| self.default.clone()),
            "no" | "n" => self
                .options
                .get(1)
                .cloned()
                .unwrap_or_else(|| self.default.clone()),
            _ => self.default.clone(),
        }
    }
}

/// Coarse task type inferred from the input, used to pick curiosity questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Code,
    Writing,
    Analysis,
    General,
}

impl TaskType {
    pub fn infer(text: &str) -> Self {
        const CODE: &[&str] = &["refactor", "function", "bug", "compile", "code", "test", "api"];
        const WRITING: &[&str] = &["write", "email", "draft", "essay", "post", "letter"];
        const ANALYSIS: &[&str] = &["analyze", "report", "data", "compare", "metrics", "trend"];

        if CODE.iter().any(|t| contains_term(text, t)) {
            Self::Code
        } else if WRITING.iter().any(|t| contains_term(text, t)) {
            Self::Writing
        } else if ANALYSIS.iter().any(|t| contains_term(text, t)) {
            Self::Analysis
        } else {
            Self::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Writing => "writing",
            Self::Analysis => "analysis",
            Self::General => "general",
        }
    }
}

/// A non-blocking question offered after a result is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuriosityQuestion {
    pub task_type: TaskType,
    /// Preference category the answer is tallied under.
    pub category: String,
    pub question: String,
    pub options: Vec<String>,
}

impl CuriosityQuestion {
    pub fn format(&self) -> String {
        format!("{} [{}]", self.question, self.options.join(" | "))
    }
}

fn words(text: &str) -> String {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();
    format!(" {} ", tokens.join(" "))
}

/// Case-insensitive whole-word (or whole-phrase) containment.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    let needle = words(term);
    if needle.trim().is_empty() {
        return false;
    }
    words(haystack).contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_clarifier_format() {
        let c = Clarifier::new("Which tone fits?", &["formal", "casual"], "formal");
        assert_eq!(
            c.format(),
            "Clarifier: Which tone fits? [formal | casual] (default: formal)"
        );
    }

    #[test]
    fn test_multiple_clarifiers_numbered() {
        let a = AmbiguityCategory::Tone.clarifier();
        let b = AmbiguityCategory::Length.clarifier();
        let text = Clarifier::format_all(&[a, b]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Clarifier: Please specify:");
        assert!(lines[1].starts_with("1. Which tone fits?"));
        assert!(lines[2].starts_with("2. How long should it be?"));
        assert!(Clarifier::format_all(&[]).is_none());
    }

    #[test]
    fn test_resolve_response() {
        let c = AmbiguityCategory::Tone.clarifier();
        assert_eq!(c.resolve("Casual"), "casual");
        assert_eq!(c.resolve("yes"), "formal");
        assert_eq!(c.resolve("no"), "casual");
        assert_eq!(c.resolve("whatever"), "neutral");
    }

    #[test]
    fn test_contains_term_is_word_bounded() {
        assert!(contains_term("Please DELETE the row", "delete"));
        assert!(!contains_term("undeleted rows", "delete"));
        assert!(contains_term("a deep dive, please", "deep dive"));
        assert!(contains_term("keep it read-only", "read-only"));
        assert!(!contains_term("anything", ""));
    }

    #[test]
    fn test_category_round_trip_names() {
        for category in AmbiguityCategory::ALL {
            assert_eq!(AmbiguityCategory::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_task_type_inference() {
        assert_eq!(TaskType::infer("Refactor parse_event"), TaskType::Code);
        assert_eq!(TaskType::infer("Write an email to Sam"), TaskType::Writing);
        assert_eq!(TaskType::infer("Compare quarterly metrics"), TaskType::Analysis);
        assert_eq!(TaskType::infer("hello"), TaskType::General);
    }
}
