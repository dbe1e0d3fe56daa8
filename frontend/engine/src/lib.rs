//! CheckIT kiosk game engine.
//!
//! The logic shared by the three event-kiosk mini-games (timed quiz,
//! safe/unsafe swipe classifier, cable-patching game): a decaying per-round
//! score, a round controller that accepts exactly one answer per round, a
//! checkpoint store that makes reloads resume with the same clock instead of
//! a fresh one, and a session orchestrator that reports the final result to
//! the backend exactly once. Rendering, the backend API, and the hardware
//! service are external collaborators.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scoring;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::GameError;
pub use models::{
    AnswerValue, Checkpoint, GamePhase, GameType, Round, RoundKind, RoundOutcome,
    SessionEvent, SessionReport, SessionSummary,
};
pub use services::{
    CheckpointStore, GameService, MemoryCheckpointStore, PlayerInput, RoundController,
    SessionStart,
};

/// Install the tracing subscriber for the kiosk shell. Safe to call once at
/// startup; tests use their own subscriber.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkit_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
