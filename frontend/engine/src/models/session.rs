use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::{RoundOutcome, SessionSummary};
use super::round::{AnswerValue, GameType};

/// Lifecycle phase of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Playing,
    Feedback,
    Finished,
}

/// Serialized snapshot of a running session, written to the key-value store
/// after every scored event (and continuously while playing) so a page
/// reload resumes with the same decaying clock instead of a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    pub user_id: i64,
    pub game_type: GameType,
    /// Round ids in this session's play order. Swipe-card order is shuffled
    /// once per session, so resuming has to restore the same order.
    pub round_order: Vec<String>,
    pub round_index: usize,
    pub total_score: u32,
    pub outcomes: Vec<RoundOutcome>,
    pub answers: BTreeMap<String, AnswerValue>,
    pub session_started_at: DateTime<Utc>,
    pub round_started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Storage key, one live session per user and game.
    pub fn storage_key(game_type: GameType, user_id: i64) -> String {
        format!("{}_state_{}", game_type.as_str(), user_id)
    }

    pub fn key(&self) -> String {
        Self::storage_key(self.game_type, self.user_id)
    }
}

/// Final session result submitted to the scoring endpoint, shaped exactly
/// like the CheckIT `POST /games/submit` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitScoreRequest {
    pub user_id: i64,
    pub game_type: GameType,
    pub answers: BTreeMap<String, AnswerValue>,
    pub duration_ms: i64,
    pub score: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitScoreResponse {
    pub score: i64,
}

/// What the kiosk shell renders on the end screen. The score here is the
/// locally computed one and stays authoritative for the user even when the
/// submission to the backend failed.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub user_id: i64,
    pub game_type: GameType,
    pub score: u32,
    pub duration_ms: i64,
    pub summary: SessionSummary,
    pub submitted: bool,
}
