use thiserror::Error;

use crate::models::GameType;

/// Failures the kiosk shell has to distinguish.
///
/// `EventClosed` is terminal for the current visit: the administrator has
/// paused or ended the competition and the screen must show a blocking
/// message instead of retrying. Everything else is either transient
/// transport trouble or a content problem worth a distinct message.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("event is paused or closed by the administrator")]
    EventClosed,

    #[error("content endpoint for {game_type} returned status {status}")]
    ContentUnavailable { game_type: GameType, status: u16 },

    #[error("no rounds available for {0}")]
    EmptyRoundList(GameType),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed content payload: {0}")]
    MalformedContent(#[from] serde_json::Error),
}

impl GameError {
    /// Terminal errors must not be retried and must not resume a checkpoint
    /// during this visit.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameError::EventClosed)
    }
}
