use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The three CheckIT mini-games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Timed multiple-choice quiz.
    BinaryBrain,
    /// Swipe-based safe/unsafe classifier.
    ItMatch,
    /// Physical cable-patching game, completion reported by hardware.
    PatchMaster,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::BinaryBrain => "binary_brain",
            GameType::ItMatch => "it_match",
            GameType::PatchMaster => "patch_master",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value a player chose for a round. Serialized untagged so the
/// submission payload carries plain strings (quiz option text) and booleans
/// ("I think this is safe" / "panel solved"), matching what the backend
/// expects in the answers map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(String),
    Flag(bool),
}

/// How a round decides correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundKind {
    /// One correct option plus decoys; option order is shuffled per display.
    MultipleChoice {
        correct: String,
        decoys: Vec<String>,
    },
    /// Swipe right if safe, left if dangerous.
    SafeOrDanger { safe: bool },
    /// Resolved by an external completion signal (patch panel solved).
    HardwareTask,
}

/// One scored unit of gameplay: a quiz question, a swipe card, or a
/// hardware task. Immutable once fetched from the content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub kind: RoundKind,
}

impl Round {
    pub fn is_correct(&self, answer: &AnswerValue) -> bool {
        match (&self.kind, answer) {
            (RoundKind::MultipleChoice { correct, .. }, AnswerValue::Choice(chosen)) => {
                chosen.trim() == correct.trim()
            }
            (RoundKind::SafeOrDanger { safe }, AnswerValue::Flag(chose_safe)) => {
                chose_safe == safe
            }
            (RoundKind::HardwareTask, AnswerValue::Flag(solved)) => *solved,
            _ => false,
        }
    }

    /// Options for a multiple-choice round in uniformly shuffled order, so
    /// the correct answer's position is not learnable across plays. Empty
    /// for the other round kinds.
    pub fn shuffled_options<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        match &self.kind {
            RoundKind::MultipleChoice { correct, decoys } => {
                let mut options: Vec<String> = Vec::with_capacity(decoys.len() + 1);
                options.push(correct.clone());
                options.extend(decoys.iter().cloned());
                options.shuffle(rng);
                options
            }
            _ => Vec::new(),
        }
    }
}
