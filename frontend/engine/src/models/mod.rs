pub mod events;
pub mod outcome;
pub mod round;
pub mod session;

pub use events::{RoundResolved, RoundStarted, ScoreTick, SessionEvent, SessionFinished};
pub use outcome::{RoundFailureReason, RoundOutcome, SessionSummary};
pub use round::{AnswerValue, GameType, Round, RoundKind};
pub use session::{
    Checkpoint, GamePhase, SessionReport, SubmitScoreRequest, SubmitScoreResponse,
};
