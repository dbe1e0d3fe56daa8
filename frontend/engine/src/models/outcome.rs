use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::round::AnswerValue;

/// Why a round resolved without points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundFailureReason {
    WrongAnswer,
    Timeout,
}

/// Result of answering one round. Created exactly once per round and
/// appended to the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round_id: String,
    pub answer: AnswerValue,
    pub correct: bool,
    pub points: u32,
    pub latency_ms: i64,
    pub resolved_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RoundFailureReason>,
}

/// End-screen statistics computed over the outcome history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub fastest_ms: Option<i64>,
    pub slowest_ms: Option<i64>,
}

impl SessionSummary {
    pub fn from_outcomes(outcomes: &[RoundOutcome]) -> Self {
        let correct_count = outcomes.iter().filter(|o| o.correct).count();
        Self {
            correct_count,
            incorrect_count: outcomes.len() - correct_count,
            fastest_ms: outcomes.iter().map(|o| o.latency_ms).min(),
            slowest_ms: outcomes.iter().map(|o| o.latency_ms).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::round::AnswerValue;

    fn outcome(latency_ms: i64, correct: bool) -> RoundOutcome {
        RoundOutcome {
            round_id: format!("q{}", latency_ms),
            answer: AnswerValue::Flag(correct),
            correct,
            points: if correct { 500 } else { 0 },
            latency_ms,
            resolved_at: Utc::now(),
            reason: (!correct).then_some(RoundFailureReason::WrongAnswer),
        }
    }

    #[test]
    fn summary_over_empty_history() {
        let summary = SessionSummary::from_outcomes(&[]);
        assert_eq!(summary.correct_count, 0);
        assert_eq!(summary.incorrect_count, 0);
        assert_eq!(summary.fastest_ms, None);
        assert_eq!(summary.slowest_ms, None);
    }

    #[test]
    fn summary_tracks_extremes_and_counts() {
        let history = [outcome(3200, true), outcome(800, false), outcome(1500, true)];
        let summary = SessionSummary::from_outcomes(&history);
        assert_eq!(summary.correct_count, 2);
        assert_eq!(summary.incorrect_count, 1);
        assert_eq!(summary.fastest_ms, Some(800));
        assert_eq!(summary.slowest_ms, Some(3200));
    }
}
