//! Post-execution curiosity questions.
//!
//! Never blocks a result. A question is offered only when the user has been
//! engaged recently and tends to answer, and not more often than the cooldown
//! allows. Answers build a per-category preference tally.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::models::{CuriosityQuestion, Draft, TaskType};

const INITIAL_ENGAGEMENT: f64 = 0.5;
const MIN_ENGAGEMENT: f64 = 0.3;
const MIN_INTERACTIONS: u32 = 2;
const MIN_RESPONSE_RATE: f64 = 0.2;
const RESPONSE_BOOST: f64 = 0.05;
const SILENCE_PENALTY: f64 = 0.02;

/// `(category, question, options)`
type PoolEntry = (&'static str, &'static str, &'static [&'static str]);

const CODE_POOL: &[PoolEntry] = &[
    ("comments", "Want short comments explaining changes?", &["yes", "no"]),
    ("testing", "Should changes ship with tests?", &["always", "when risky", "no"]),
];

const WRITING_POOL: &[PoolEntry] = &[
    ("tone", "Do you usually prefer a formal or casual tone?", &["formal", "casual"]),
    ("length", "Shorter or longer drafts?", &["shorter", "longer"]),
];

const ANALYSIS_POOL: &[PoolEntry] = &[
    ("format", "Charts or tables for results?", &["charts", "tables"]),
    ("detail-level", "Summary first or full breakdown?", &["summary", "breakdown"]),
];

const GENERAL_POOL: &[PoolEntry] = &[("format", "Bullet points or prose?", &["bullets", "prose"])];

fn pool(task_type: TaskType) -> &'static [PoolEntry] {
    match task_type {
        TaskType::Code => CODE_POOL,
        TaskType::Writing => WRITING_POOL,
        TaskType::Analysis => ANALYSIS_POOL,
        TaskType::General => GENERAL_POOL,
    }
}

#[derive(Debug)]
struct CuriosityState {
    engagement: f64,
    interactions: u32,
    asked: u32,
    responses: u32,
    last_asked: Option<Instant>,
    tally: HashMap<String, BTreeMap<String, u32>>,
}

impl CuriosityState {
    fn response_rate(&self) -> f64 {
        if self.asked == 0 {
            1.0
        } else {
            f64::from(self.responses) / f64::from(self.asked)
        }
    }
}

/// Snapshot of the engagement heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementSnapshot {
    pub engagement: f64,
    pub interactions: u32,
    pub asked: u32,
    pub responses: u32,
    pub response_rate: f64,
}

/// Engagement-gated follow-up question source.
#[derive(Debug)]
pub struct CuriosityDetector {
    cooldown: Duration,
    state: Mutex<CuriosityState>,
}

impl CuriosityDetector {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: Mutex::new(CuriosityState {
                engagement: INITIAL_ENGAGEMENT,
                interactions: 0,
                asked: 0,
                responses: 0,
                last_asked: None,
                tally: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CuriosityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_interaction(&self) {
        self.state().interactions += 1;
    }

    /// Offer a question if every gate passes. Marks the question as asked.
    pub fn suggest(&self, draft: &Draft) -> Option<CuriosityQuestion> {
        let mut state = self.state();

        let cooled_down = !matches!(state.last_asked, Some(t) if t.elapsed() <= self.cooldown);
        if state.engagement <= MIN_ENGAGEMENT
            || state.interactions < MIN_INTERACTIONS
            || !cooled_down
            || state.response_rate() <= MIN_RESPONSE_RATE
        {
            return None;
        }

        let task_type = TaskType::infer(&format!("{} {}", draft.input_text, draft.goal));
        let questions = pool(task_type);
        let (category, question, options) = questions
            .iter()
            .find(|(category, _, _)| !state.tally.contains_key(*category))
            .or_else(|| questions.get(state.asked as usize % questions.len()))?;

        state.asked += 1;
        state.last_asked = Some(Instant::now());

        Some(CuriosityQuestion {
            task_type,
            category: (*category).to_string(),
            question: (*question).to_string(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
        })
    }

    pub fn record_response(&self, category: &str, value: &str) {
        let mut state = self.state();
        *state
            .tally
            .entry(category.trim().to_lowercase())
            .or_default()
            .entry(value.trim().to_lowercase())
            .or_insert(0) += 1;
        state.responses += 1;
        state.engagement = (state.engagement + RESPONSE_BOOST).clamp(0.0, 1.0);
    }

    pub fn record_silence(&self) {
        let mut state = self.state();
        state.engagement = (state.engagement - SILENCE_PENALTY).clamp(0.0, 1.0);
    }

    /// Most frequent answer for `category`; ties go to the smallest value.
    pub fn preference(&self, category: &str) -> Option<String> {
        let state = self.state();
        let counts = state.tally.get(&category.trim().to_lowercase())?;
        // Equal counts compare by reversed key so the smallest value wins.
        counts
            .iter()
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
            .map(|(value, _)| value.clone())
    }

    pub fn snapshot(&self) -> EngagementSnapshot {
        let state = self.state();
        EngagementSnapshot {
            engagement: state.engagement,
            interactions: state.interactions,
            asked: state.asked,
            responses: state.responses,
            response_rate: state.response_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warmed_up(cooldown: Duration) -> CuriosityDetector {
        let detector = CuriosityDetector::new(cooldown);
        detector.record_interaction();
        detector.record_interaction();
        detector
    }

    fn draft() -> Draft {
        Draft::new("Write an email to the team", "announce the release", "")
    }

    #[test]
    fn test_requires_prior_interactions() {
        let detector = CuriosityDetector::new(Duration::from_secs(300));
        assert!(detector.suggest(&draft()).is_none());
        detector.record_interaction();
        assert!(detector.suggest(&draft()).is_none());
        detector.record_interaction();
        assert!(detector.suggest(&draft()).is_some());
    }

    #[test]
    fn test_question_matches_task_type() {
        let detector = warmed_up(Duration::from_secs(300));
        let question = detector.suggest(&draft()).unwrap();
        assert_eq!(question.task_type, TaskType::Writing);
        assert_eq!(question.category, "tone");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_between_questions() {
        let detector = warmed_up(Duration::from_secs(300));
        assert!(detector.suggest(&draft()).is_some());
        detector.record_response("tone", "formal");
        assert!(detector.suggest(&draft()).is_none());

        tokio::time::advance(Duration::from_secs(301)).await;
        let next = detector.suggest(&draft()).unwrap();
        assert_eq!(next.category, "length");
    }

    #[test]
    fn test_low_engagement_suppresses_questions() {
        let detector = warmed_up(Duration::ZERO);
        for _ in 0..15 {
            detector.record_silence();
        }
        assert!(detector.snapshot().engagement <= MIN_ENGAGEMENT);
        assert!(detector.suggest(&draft()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_response_rate_suppresses_questions() {
        let detector = warmed_up(Duration::from_millis(1));
        for _ in 0..5 {
            tokio::time::advance(Duration::from_millis(2)).await;
            if detector.suggest(&draft()).is_none() {
                break;
            }
        }
        // Asked at least once, never answered: rate is zero.
        assert_eq!(detector.snapshot().responses, 0);
        assert!(detector.snapshot().response_rate <= MIN_RESPONSE_RATE);
        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(detector.suggest(&draft()).is_none());
    }

    #[test]
    fn test_engagement_clamped() {
        let detector = CuriosityDetector::new(Duration::ZERO);
        for _ in 0..20 {
            detector.record_response("tone", "formal");
        }
        assert!((detector.snapshot().engagement - 1.0).abs() < f64::EPSILON);
        for _ in 0..100 {
            detector.record_silence();
        }
        assert!(detector.snapshot().engagement.abs() < f64::EPSILON);
    }

    #[test]
    fn test_preference_is_most_frequent() {
        let detector = CuriosityDetector::new(Duration::ZERO);
        detector.record_response("tone", "casual");
        detector.record_response("tone", "formal");
        detector.record_response("tone", "Formal");
        assert_eq!(detector.preference("tone").as_deref(), Some("formal"));
        assert!(detector.preference("length").is_none());
    }

    #[test]
    fn test_preference_tie_breaks_lexicographically() {
        let detector = CuriosityDetector::new(Duration::ZERO);
        detector.record_response("format", "tables");
        detector.record_response("format", "charts");
        assert_eq!(detector.preference("format").as_deref(), Some("charts"));
    }
}
