use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::RoundOutcome;

/// Events the session runner streams to the kiosk shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    ScoreTick(ScoreTick),
    RoundResolved(RoundResolved),
    RoundStarted(RoundStarted),
    SessionFinished(SessionFinished),
}

/// Periodic refresh of the decaying counter while a round is playing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTick {
    pub session_id: String,
    pub round_index: usize,
    pub potential_score: u32,
    pub total_score: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResolved {
    pub session_id: String,
    pub round_index: usize,
    pub outcome: RoundOutcome,
    pub total_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStarted {
    pub session_id: String,
    pub round_index: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFinished {
    pub session_id: String,
    pub score: u32,
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::ScoreTick(_) => "score-tick",
            SessionEvent::RoundResolved(_) => "round-resolved",
            SessionEvent::RoundStarted(_) => "round-started",
            SessionEvent::SessionFinished(_) => "session-finished",
        }
    }
}
