use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::metrics::ROUNDS_RESOLVED_TOTAL;
use crate::models::{
    AnswerValue, Checkpoint, GamePhase, GameType, Round, RoundFailureReason, RoundOutcome,
    SessionSummary,
};
use crate::scoring::{self, FEEDBACK_DURATION_MS};

/// What `tick` observed while moving the clock forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The round's potential score hit zero before a response arrived; it
    /// was resolved as a timeout with zero points.
    TimedOut(RoundOutcome),
    /// The feedback hold elapsed and the next round started.
    Advanced { round_index: usize },
    /// The feedback hold elapsed after the last round.
    Finished,
}

/// Per-round orchestration for one game session: shows one round at a time,
/// accepts exactly one answer per round, holds a fixed feedback state, then
/// advances. All state transitions take an explicit `now`, so the same
/// machine is driven by `Utc::now()` in the kiosk and by synthetic clocks in
/// tests, and the points awarded are always computed from real elapsed time
/// rather than whatever the display tick last showed.
#[derive(Debug)]
pub struct RoundController {
    session_id: String,
    user_id: i64,
    game_type: GameType,
    rounds: Vec<Round>,
    round_index: usize,
    phase: GamePhase,
    total_score: u32,
    outcomes: Vec<RoundOutcome>,
    answers: BTreeMap<String, AnswerValue>,
    session_started_at: DateTime<Utc>,
    round_started_at: DateTime<Utc>,
    feedback_until: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    feedback_ms: i64,
}

/// Result of validating a checkpoint against the fetched round list.
pub enum ResumeOutcome {
    /// Mid-session snapshot; play continues from it.
    Active(Box<RoundController>),
    /// Round index at or past the end: the session already completed and
    /// must be finalized from the snapshot, never replayed.
    AlreadyFinished(Checkpoint),
}

impl RoundController {
    pub fn new(user_id: i64, game_type: GameType, rounds: Vec<Round>, now: DateTime<Utc>) -> Self {
        // An empty round list has nothing to play; the session is finished
        // from the start instead of stalling on a round that isn't there.
        let (phase, finished_at) = if rounds.is_empty() {
            (GamePhase::Finished, Some(now))
        } else {
            (GamePhase::Playing, None)
        };
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            game_type,
            rounds,
            round_index: 0,
            phase,
            total_score: 0,
            outcomes: Vec::new(),
            answers: BTreeMap::new(),
            session_started_at: now,
            round_started_at: now,
            feedback_until: None,
            finished_at,
            feedback_ms: FEEDBACK_DURATION_MS,
        }
    }

    /// Rebuild a controller from a checkpoint, keeping the original round
    /// clock so a reload neither resets nor extends the decay.
    ///
    /// Returns `None` when the snapshot does not fit the fetched content
    /// (index past the list plus one, unknown round ids, more outcomes than
    /// rounds); such checkpoints are discarded and a fresh session starts.
    pub fn resume(
        rounds: Vec<Round>,
        checkpoint: Checkpoint,
        now: DateTime<Utc>,
    ) -> Option<ResumeOutcome> {
        if checkpoint.round_index > rounds.len()
            || checkpoint.outcomes.len() > rounds.len()
            || checkpoint.round_order.len() != rounds.len()
        {
            return None;
        }
        if checkpoint.round_index >= rounds.len() {
            return Some(ResumeOutcome::AlreadyFinished(checkpoint));
        }

        // Restore this session's play order; content is static for the
        // session's lifetime, so every saved id must still exist.
        let mut by_id: BTreeMap<String, Round> =
            rounds.into_iter().map(|r| (r.id.clone(), r)).collect();
        let mut ordered = Vec::with_capacity(checkpoint.round_order.len());
        for id in &checkpoint.round_order {
            ordered.push(by_id.remove(id)?);
        }

        let mut controller = Self {
            session_id: checkpoint.session_id,
            user_id: checkpoint.user_id,
            game_type: checkpoint.game_type,
            rounds: ordered,
            round_index: checkpoint.round_index,
            phase: GamePhase::Playing,
            total_score: checkpoint.total_score,
            outcomes: checkpoint.outcomes,
            answers: checkpoint.answers,
            session_started_at: checkpoint.session_started_at,
            round_started_at: checkpoint.round_started_at,
            feedback_until: None,
            finished_at: None,
            feedback_ms: FEEDBACK_DURATION_MS,
        };

        // A reload that happened during the feedback hold left the current
        // round already resolved; skip straight to the next one.
        if controller.outcomes.len() > controller.round_index {
            controller.round_index += 1;
            controller.round_started_at = now;
            if controller.round_index >= controller.rounds.len() {
                controller.phase = GamePhase::Finished;
                controller.finished_at = Some(now);
            }
        }

        Some(ResumeOutcome::Active(Box::new(controller)))
    }

    /// Shrink the feedback hold; used by tests and demo setups.
    pub fn with_feedback_duration(mut self, feedback_ms: i64) -> Self {
        self.feedback_ms = feedback_ms;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn outcomes(&self) -> &[RoundOutcome] {
        &self.outcomes
    }

    pub fn answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.answers
    }

    pub fn session_started_at(&self) -> DateTime<Utc> {
        self.session_started_at
    }

    pub fn round_started_at(&self) -> DateTime<Utc> {
        self.round_started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// The round currently shown, if the session is still running.
    pub fn current_round(&self) -> Option<&Round> {
        match self.phase {
            GamePhase::Finished => None,
            _ => self.rounds.get(self.round_index),
        }
    }

    /// Decaying value a correct answer would earn right now. Zero outside
    /// the playing phase.
    pub fn potential_score(&self, now: DateTime<Utc>) -> u32 {
        match self.phase {
            GamePhase::Playing => scoring::potential_score(self.elapsed_in_round(now)),
            _ => 0,
        }
    }

    fn elapsed_in_round(&self, now: DateTime<Utc>) -> i64 {
        (now - self.round_started_at).num_milliseconds()
    }

    /// Record the player's answer for the current round. Only accepted while
    /// playing; a second response during feedback or after the end is a
    /// no-op returning `None`.
    pub fn submit_answer(&mut self, answer: AnswerValue, now: DateTime<Utc>) -> Option<RoundOutcome> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let round = self.rounds.get(self.round_index)?;
        let correct = round.is_correct(&answer);
        let reason = (!correct).then_some(RoundFailureReason::WrongAnswer);
        Some(self.resolve(answer, correct, reason, now))
    }

    /// Advance the clock: auto-resolve a timed-out round, or leave feedback
    /// once the hold elapsed. Safe to call at any cadence.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Transition> {
        let mut transitions = Vec::new();

        if self.phase == GamePhase::Playing && self.potential_score(now) == 0 {
            // Nothing left to earn: resolve as a timeout so the session can
            // never stall on an unanswered round.
            let answer = self.timeout_answer();
            let outcome = self.resolve(answer, false, Some(RoundFailureReason::Timeout), now);
            transitions.push(Transition::TimedOut(outcome));
        }

        if self.phase == GamePhase::Feedback {
            let held_long_enough = self
                .feedback_until
                .map(|until| now >= until)
                .unwrap_or(true);
            if held_long_enough {
                transitions.push(self.advance(now));
            }
        }

        transitions
    }

    fn timeout_answer(&self) -> AnswerValue {
        match self.rounds[self.round_index].kind {
            crate::models::RoundKind::MultipleChoice { .. } => {
                AnswerValue::Choice("TIMEOUT".to_string())
            }
            _ => AnswerValue::Flag(false),
        }
    }

    fn resolve(
        &mut self,
        answer: AnswerValue,
        correct: bool,
        reason: Option<RoundFailureReason>,
        now: DateTime<Utc>,
    ) -> RoundOutcome {
        let round_id = self.rounds[self.round_index].id.clone();
        let latency_ms = self.elapsed_in_round(now).max(0);
        let points = if correct {
            scoring::potential_score(latency_ms)
        } else {
            0
        };

        let outcome = RoundOutcome {
            round_id: round_id.clone(),
            answer: answer.clone(),
            correct,
            points,
            latency_ms,
            resolved_at: now,
            reason,
        };

        self.total_score += points;
        self.answers.insert(round_id, answer);
        self.outcomes.push(outcome.clone());
        self.phase = GamePhase::Feedback;
        self.feedback_until = Some(now + chrono::Duration::milliseconds(self.feedback_ms));

        let result_label = match reason {
            Some(RoundFailureReason::Timeout) => "timeout",
            Some(RoundFailureReason::WrongAnswer) => "incorrect",
            None => "correct",
        };
        ROUNDS_RESOLVED_TOTAL.with_label_values(&[result_label]).inc();
        tracing::info!(
            session_id = %self.session_id,
            round_index = self.round_index,
            correct,
            points,
            latency_ms,
            "round resolved"
        );

        outcome
    }

    fn advance(&mut self, now: DateTime<Utc>) -> Transition {
        self.feedback_until = None;
        if self.round_index + 1 < self.rounds.len() {
            self.round_index += 1;
            self.round_started_at = now;
            self.phase = GamePhase::Playing;
            Transition::Advanced {
                round_index: self.round_index,
            }
        } else {
            self.round_index = self.rounds.len();
            self.phase = GamePhase::Finished;
            self.finished_at = Some(now);
            tracing::info!(
                session_id = %self.session_id,
                score = self.total_score,
                "session finished"
            );
            Transition::Finished
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_outcomes(&self.outcomes)
    }

    /// Snapshot the full session state for the checkpoint store.
    pub fn checkpoint(&self, now: DateTime<Utc>) -> Checkpoint {
        Checkpoint {
            session_id: self.session_id.clone(),
            user_id: self.user_id,
            game_type: self.game_type,
            round_order: self.rounds.iter().map(|r| r.id.clone()).collect(),
            round_index: self.round_index,
            total_score: self.total_score,
            outcomes: self.outcomes.clone(),
            answers: self.answers.clone(),
            session_started_at: self.session_started_at,
            round_started_at: self.round_started_at,
            saved_at: now,
        }
    }
}
