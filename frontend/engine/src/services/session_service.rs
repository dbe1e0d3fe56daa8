use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::GameError;
use crate::metrics::{SESSIONS_ACTIVE, SESSIONS_TOTAL};
use crate::models::events::{RoundResolved, RoundStarted, ScoreTick, SessionFinished};
use crate::models::{
    AnswerValue, Checkpoint, GamePhase, GameType, Round, SessionEvent, SessionReport,
    SessionSummary, SubmitScoreRequest,
};
use crate::scoring::TICK_INTERVAL_MS;

use super::checkpoint_service::CheckpointStore;
use super::content_service::ContentClient;
use super::round_controller::{ResumeOutcome, RoundController, Transition};
use super::score_service::ScoreClient;

/// How a game screen mount turned out.
#[derive(Debug)]
pub enum SessionStart {
    /// No usable checkpoint: a brand-new session.
    Fresh(Box<RoundController>),
    /// A mid-session checkpoint was restored, same index, score, history
    /// and round clock.
    Resumed(Box<RoundController>),
    /// The stored session had already completed; it was finalized from the
    /// snapshot instead of being replayed.
    AlreadyFinished(Box<SessionReport>),
}

/// Input from the kiosk shell while a session is running.
#[derive(Debug, Clone)]
pub enum PlayerInput {
    /// The player's response for the current round (option text, swipe
    /// direction, or the hardware completion signal).
    Answer(AnswerValue),
    /// The player navigated away mid-round. The checkpoint stays behind so
    /// the session is resumable.
    Quit,
}

/// Orchestrates one game attempt: fetches the round list, restores or
/// creates the controller, persists checkpoints, and reports the final
/// result to the scoring endpoint exactly once.
pub struct GameService {
    content: ContentClient,
    scores: ScoreClient,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl GameService {
    pub fn new(config: &Config, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        let http = Client::new();
        Self {
            content: ContentClient::new(http.clone(), config.backend_url.clone()),
            scores: ScoreClient::new(http, config.backend_url.clone()),
            checkpoints,
        }
    }

    /// Enter a game screen: fetch content, then resume from a checkpoint if
    /// a valid one exists, otherwise start fresh.
    ///
    /// A terminal content error (event closed) propagates without touching
    /// the checkpoint: nothing is resumed during a blocked visit.
    pub async fn start(
        &self,
        user_id: i64,
        game_type: GameType,
    ) -> Result<SessionStart, GameError> {
        let rounds = self.content.fetch_rounds(game_type).await?;
        let now = Utc::now();

        let stored = match self.checkpoints.load(game_type, user_id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Checkpoint load failed, starting fresh: {:#}", e);
                None
            }
        };

        if let Some(checkpoint) = stored {
            match RoundController::resume(rounds.clone(), checkpoint, now) {
                Some(ResumeOutcome::Active(controller)) => {
                    if controller.phase() == GamePhase::Finished {
                        // Reload happened during the last round's feedback
                        // hold; nothing is left to play.
                        SESSIONS_ACTIVE.inc();
                        let report = self.finalize(*controller).await;
                        return Ok(SessionStart::AlreadyFinished(Box::new(report)));
                    }
                    tracing::info!(
                        session_id = %controller.session_id(),
                        round_index = controller.round_index(),
                        "session resumed from checkpoint"
                    );
                    SESSIONS_TOTAL.with_label_values(&["resumed"]).inc();
                    SESSIONS_ACTIVE.inc();
                    return Ok(SessionStart::Resumed(controller));
                }
                Some(ResumeOutcome::AlreadyFinished(checkpoint)) => {
                    let report = self.finalize_from_checkpoint(checkpoint).await;
                    return Ok(SessionStart::AlreadyFinished(Box::new(report)));
                }
                None => {
                    tracing::warn!(
                        "Discarding stale checkpoint for user {} in {}",
                        user_id,
                        game_type
                    );
                    if let Err(e) = self.checkpoints.clear(game_type, user_id).await {
                        tracing::warn!("Failed to clear stale checkpoint: {:#}", e);
                    }
                }
            }
        }

        let rounds = Self::order_for_session(game_type, rounds);
        let controller = RoundController::new(user_id, game_type, rounds, now);
        tracing::info!(
            session_id = %controller.session_id(),
            %game_type,
            user_id,
            rounds = controller.round_count(),
            "session started"
        );
        SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        SESSIONS_ACTIVE.inc();
        self.save_progress(&controller).await;
        Ok(SessionStart::Fresh(Box::new(controller)))
    }

    /// Swipe cards are shuffled once per session; quiz question order comes
    /// straight from the content source (only the options shuffle, per
    /// round, at display time).
    fn order_for_session(game_type: GameType, mut rounds: Vec<Round>) -> Vec<Round> {
        if game_type == GameType::ItMatch {
            rounds.shuffle(&mut rand::rng());
        }
        rounds
    }

    /// Persist the current session state. Failures are logged and swallowed:
    /// losing one checkpoint write must never interrupt play.
    pub async fn save_progress(&self, controller: &RoundController) {
        let checkpoint = controller.checkpoint(Utc::now());
        if let Err(e) = self.checkpoints.save(&checkpoint).await {
            tracing::warn!("Checkpoint save failed: {:#}", e);
        }
    }

    /// Complete a finished session: submit the result exactly once and clear
    /// the checkpoint on success. A failed submission is logged, the
    /// checkpoint stays (the next visit finalizes from it again), and the
    /// locally computed report is returned either way — the score the player
    /// sees is already final from the kiosk's point of view.
    pub async fn finalize(&self, controller: RoundController) -> SessionReport {
        let now = Utc::now();
        if controller.phase() != GamePhase::Finished {
            tracing::warn!(
                session_id = %controller.session_id(),
                "finalize called before the session finished"
            );
        }

        // Final snapshot first: if submission fails and the kiosk restarts,
        // the next mount sees a finished checkpoint and finalizes instead of
        // replaying.
        self.save_progress(&controller).await;

        let finished_at = controller.finished_at().unwrap_or(now);
        let request = SubmitScoreRequest {
            user_id: controller.user_id(),
            game_type: controller.game_type(),
            answers: controller.answers().clone(),
            duration_ms: (finished_at - controller.session_started_at()).num_milliseconds(),
            score: controller.total_score(),
        };

        let submitted = self.scores.submit(&request).await.is_ok();
        if submitted {
            if let Err(e) = self
                .checkpoints
                .clear(controller.game_type(), controller.user_id())
                .await
            {
                tracing::warn!("Failed to clear checkpoint after submission: {:#}", e);
            }
        }

        SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
        SESSIONS_ACTIVE.dec();

        SessionReport {
            session_id: controller.session_id().to_string(),
            user_id: controller.user_id(),
            game_type: controller.game_type(),
            score: controller.total_score(),
            duration_ms: request.duration_ms,
            summary: controller.summary(),
            submitted,
        }
    }

    /// Finalize a session found already complete in the store: report it,
    /// never replay it. As in `finalize`, the snapshot is cleared only after
    /// a successful submission, so a failure here leaves it behind for the
    /// next mount to try again.
    async fn finalize_from_checkpoint(&self, checkpoint: Checkpoint) -> SessionReport {
        tracing::info!(
            session_id = %checkpoint.session_id,
            "finalizing completed session found in checkpoint store"
        );

        let duration_ms = (checkpoint.saved_at - checkpoint.session_started_at).num_milliseconds();
        let request = SubmitScoreRequest {
            user_id: checkpoint.user_id,
            game_type: checkpoint.game_type,
            answers: checkpoint.answers.clone(),
            duration_ms,
            score: checkpoint.total_score,
        };
        let submitted = self.scores.submit(&request).await.is_ok();
        if submitted {
            if let Err(e) = self
                .checkpoints
                .clear(checkpoint.game_type, checkpoint.user_id)
                .await
            {
                tracing::warn!("Failed to clear finished checkpoint: {:#}", e);
            }
        }

        SESSIONS_TOTAL.with_label_values(&["completed"]).inc();

        SessionReport {
            session_id: checkpoint.session_id,
            user_id: checkpoint.user_id,
            game_type: checkpoint.game_type,
            score: checkpoint.total_score,
            duration_ms,
            summary: SessionSummary::from_outcomes(&checkpoint.outcomes),
            submitted,
        }
    }

    /// Drive a session to completion on the UI event loop: a periodic tick
    /// recomputes the displayed potential score and checkpoints progress, a
    /// timer-driven transition ends the feedback hold, and player input
    /// arrives over a channel. All timers die with this future, so dropping
    /// it (navigation away) cancels cleanly and leaves the checkpoint
    /// resumable.
    ///
    /// Returns the final report, or `None` if the player quit mid-session.
    pub async fn run_session(
        &self,
        mut controller: RoundController,
        mut input: mpsc::Receiver<PlayerInput>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Option<SessionReport> {
        let session_id = controller.session_id().to_string();
        let mut interval =
            tokio::time::interval(std::time::Duration::from_millis(TICK_INTERVAL_MS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let _ = events
            .send(SessionEvent::RoundStarted(RoundStarted {
                session_id: session_id.clone(),
                round_index: controller.round_index(),
                started_at: controller.round_started_at(),
            }))
            .await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now();
                    for transition in controller.tick(now) {
                        match transition {
                            Transition::TimedOut(outcome) => {
                                let _ = events.send(SessionEvent::RoundResolved(RoundResolved {
                                    session_id: session_id.clone(),
                                    round_index: controller.round_index(),
                                    outcome,
                                    total_score: controller.total_score(),
                                })).await;
                            }
                            Transition::Advanced { round_index } => {
                                let _ = events.send(SessionEvent::RoundStarted(RoundStarted {
                                    session_id: session_id.clone(),
                                    round_index,
                                    started_at: controller.round_started_at(),
                                })).await;
                            }
                            Transition::Finished => {}
                        }
                        self.save_progress(&controller).await;
                    }

                    if controller.phase() == GamePhase::Finished {
                        break;
                    }

                    if controller.phase() == GamePhase::Playing {
                        // Display-only refresh; dropped ticks are harmless.
                        let _ = events.try_send(SessionEvent::ScoreTick(ScoreTick {
                            session_id: session_id.clone(),
                            round_index: controller.round_index(),
                            potential_score: controller.potential_score(now),
                            total_score: controller.total_score(),
                            timestamp: now,
                        }));
                        self.save_progress(&controller).await;
                    }
                }
                received = input.recv() => {
                    match received {
                        Some(PlayerInput::Answer(answer)) => {
                            let now = Utc::now();
                            let round_index = controller.round_index();
                            if let Some(outcome) = controller.submit_answer(answer, now) {
                                let _ = events.send(SessionEvent::RoundResolved(RoundResolved {
                                    session_id: session_id.clone(),
                                    round_index,
                                    outcome,
                                    total_score: controller.total_score(),
                                })).await;
                                self.save_progress(&controller).await;
                            }
                        }
                        Some(PlayerInput::Quit) | None => {
                            tracing::info!(session_id = %session_id, "session abandoned mid-round");
                            SESSIONS_TOTAL.with_label_values(&["abandoned"]).inc();
                            SESSIONS_ACTIVE.dec();
                            self.save_progress(&controller).await;
                            return None;
                        }
                    }
                }
            }
        }

        let report = self.finalize(controller).await;
        let _ = events
            .send(SessionEvent::SessionFinished(SessionFinished {
                session_id,
                score: report.score,
                timestamp: Utc::now(),
            }))
            .await;
        Some(report)
    }
}
