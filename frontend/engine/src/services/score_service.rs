use anyhow::{Context, Result};
use reqwest::Client;

use crate::metrics::SCORE_SUBMISSIONS_TOTAL;
use crate::models::{SubmitScoreRequest, SubmitScoreResponse};

/// Client for the CheckIT scoring endpoint (`POST /api/v1/games/submit`).
///
/// The server does not guarantee idempotent submissions, so the session
/// service calls this at most once per finished session.
pub struct ScoreClient {
    http: Client,
    base_url: String,
}

impl ScoreClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn submit(&self, request: &SubmitScoreRequest) -> Result<SubmitScoreResponse> {
        let url = format!("{}/api/v1/games/submit", self.base_url);

        let result = self.try_submit(&url, request).await;
        let status = if result.is_ok() { "success" } else { "error" };
        SCORE_SUBMISSIONS_TOTAL.with_label_values(&[status]).inc();

        match &result {
            Ok(response) => tracing::info!(
                user_id = request.user_id,
                game_type = %request.game_type,
                score = response.score,
                "score submitted"
            ),
            Err(e) => tracing::warn!(
                user_id = request.user_id,
                game_type = %request.game_type,
                "score submission failed: {:#}",
                e
            ),
        }

        result
    }

    async fn try_submit(&self, url: &str, request: &SubmitScoreRequest) -> Result<SubmitScoreResponse> {
        let response = self
            .http
            .post(url)
            .json(request)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .context("Failed to reach scoring endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Scoring endpoint returned {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse scoring response")
    }
}
