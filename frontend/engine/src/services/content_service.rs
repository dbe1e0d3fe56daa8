use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};

use crate::error::GameError;
use crate::models::{GameType, Round, RoundKind};
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Client for the CheckIT content endpoint
/// (`GET /api/v1/games/content/{game_type}`).
///
/// The round list is fetched once per session and treated as static for the
/// session's lifetime. A 403 means the administrator paused or ended the
/// event; that is terminal for the visit and is never retried. Transport
/// errors (connection refused, timeouts) get a short bounded retry.
pub struct ContentClient {
    http: Client,
    base_url: String,
}

// Content rows come from CSV imports; ids arrive as numbers or strings
// depending on the game and are normalized to strings here.
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

fn none_image(image: Option<String>) -> Option<String> {
    image.filter(|i| !i.is_empty() && i != "none")
}

#[derive(Debug, Deserialize)]
struct QuizRow {
    #[serde(deserialize_with = "id_from_number_or_string")]
    id: String,
    question: String,
    #[serde(default)]
    image: Option<String>,
    answer_correct: String,
    answer_wrong1: String,
    answer_wrong2: String,
    answer_wrong3: String,
}

#[derive(Debug, Deserialize)]
struct SwipeRow {
    #[serde(deserialize_with = "id_from_number_or_string")]
    id: String,
    question: String,
    #[serde(default)]
    image: Option<String>,
    is_correct: bool,
}

#[derive(Debug, Deserialize)]
struct HardwareRow {
    #[serde(deserialize_with = "id_from_number_or_string")]
    id: String,
    question: String,
}

impl ContentClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_rounds(&self, game_type: GameType) -> Result<Vec<Round>, GameError> {
        let url = format!(
            "{}/api/v1/games/content/{}",
            self.base_url,
            game_type.as_str()
        );
        tracing::debug!("Fetching round content from {}", url);

        let response = retry_async_with_config(RetryConfig::transport(), || async {
            self.http
                .get(&url)
                .timeout(std::time::Duration::from_secs(5))
                .send()
                .await
        })
        .await?;

        match response.status() {
            StatusCode::FORBIDDEN => return Err(GameError::EventClosed),
            status if !status.is_success() => {
                return Err(GameError::ContentUnavailable {
                    game_type,
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        let body = response.text().await?;
        let rounds = self.parse_rounds(game_type, &body)?;
        if rounds.is_empty() {
            return Err(GameError::EmptyRoundList(game_type));
        }

        tracing::info!("Fetched {} rounds for {}", rounds.len(), game_type);
        Ok(rounds)
    }

    fn parse_rounds(&self, game_type: GameType, body: &str) -> Result<Vec<Round>, GameError> {
        let rounds = match game_type {
            GameType::BinaryBrain => {
                let rows: Vec<QuizRow> = serde_json::from_str(body)?;
                rows.into_iter()
                    .map(|row| Round {
                        id: row.id,
                        prompt: row.question,
                        image: none_image(row.image),
                        kind: RoundKind::MultipleChoice {
                            correct: row.answer_correct,
                            decoys: vec![row.answer_wrong1, row.answer_wrong2, row.answer_wrong3],
                        },
                    })
                    .collect()
            }
            GameType::ItMatch => {
                let rows: Vec<SwipeRow> = serde_json::from_str(body)?;
                rows.into_iter()
                    .map(|row| Round {
                        id: row.id,
                        prompt: row.question,
                        image: none_image(row.image),
                        kind: RoundKind::SafeOrDanger {
                            safe: row.is_correct,
                        },
                    })
                    .collect()
            }
            GameType::PatchMaster => {
                let rows: Vec<HardwareRow> = serde_json::from_str(body)?;
                rows.into_iter()
                    .map(|row| Round {
                        id: row.id,
                        prompt: row.question,
                        image: None,
                        kind: RoundKind::HardwareTask,
                    })
                    .collect()
            }
        };
        Ok(rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ContentClient {
        ContentClient::new(Client::new(), "http://localhost:8000")
    }

    #[test]
    fn quiz_rows_become_multiple_choice_rounds() {
        let body = r#"[{
            "id": 7,
            "question": "Which port does HTTPS use?",
            "image": "none",
            "answer_correct": "443",
            "answer_wrong1": "80",
            "answer_wrong2": "22",
            "answer_wrong3": "8080"
        }]"#;

        let rounds = client().parse_rounds(GameType::BinaryBrain, body).unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].id, "7");
        assert_eq!(rounds[0].image, None);
        match &rounds[0].kind {
            RoundKind::MultipleChoice { correct, decoys } => {
                assert_eq!(correct, "443");
                assert_eq!(decoys.len(), 3);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn swipe_rows_keep_their_safety_flag_and_image() {
        let body = r#"[
            {"id": "1", "question": "USB from the parking lot", "image": "usb.jpg", "is_correct": false},
            {"id": "2", "question": "Password manager", "is_correct": true}
        ]"#;

        let rounds = client().parse_rounds(GameType::ItMatch, body).unwrap();
        assert_eq!(rounds[0].image.as_deref(), Some("usb.jpg"));
        assert_eq!(rounds[0].kind, RoundKind::SafeOrDanger { safe: false });
        assert_eq!(rounds[1].kind, RoundKind::SafeOrDanger { safe: true });
    }

    #[test]
    fn malformed_rows_are_a_content_error() {
        let err = client()
            .parse_rounds(GameType::BinaryBrain, r#"[{"id": 1}]"#)
            .unwrap_err();
        assert!(matches!(err, GameError::MalformedContent(_)));
    }
}
