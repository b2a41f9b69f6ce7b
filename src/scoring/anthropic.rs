//! Anthropic-backed scorer — one strict-JSON completion per completed round.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::ScoreError;
use crate::intake::model::{Role, RoundScore, ScoreCategory, TranscriptMessage};

use super::ScoreProvider;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic scorer.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub api_key: SecretString,
    pub model: String,
}

/// Scores rounds by asking the model for a single JSON object.
pub struct AnthropicScorer {
    config: ScorerConfig,
    client: reqwest::Client,
}

impl AnthropicScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn scoring_prompt(transcript: &[TranscriptMessage]) -> String {
        let conversation = transcript
            .iter()
            .map(|m| {
                let speaker = match m.role {
                    Role::User => "Prospect",
                    Role::Assistant => "Agent",
                };
                format!("{}: {}", speaker, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Given this B2B qualification conversation:\n\n\
             {conversation}\n\n\
             Rate how qualified this prospect is on a 0-100 scale, weighing \
             problem clarity, decision-making authority, timeline urgency, and \
             budget readiness.\n\n\
             Respond with ONLY valid JSON, no explanation or markdown formatting:\n\
             {{\"totalScore\": <integer 0-100>}}"
        )
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ScorePayload {
    #[serde(rename = "totalScore")]
    total_score: u32,
}

#[async_trait]
impl ScoreProvider for AnthropicScorer {
    async fn score(&self, transcript: &[TranscriptMessage]) -> Result<RoundScore, ScoreError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": 256,
            "temperature": 0.0,
            "messages": [{
                "role": "user",
                "content": Self::scoring_prompt(transcript),
            }],
        });

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoreError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScoreError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ScoreError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .content
            .first()
            .map(|c| c.text.trim())
            .unwrap_or_default();
        let payload: ScorePayload = serde_json::from_str(text).map_err(|e| {
            ScoreError::InvalidResponse(format!("bad score JSON: {e} — raw: {text}"))
        })?;

        let total = payload.total_score.min(100) as u8;
        debug!(total, "Round scored");
        Ok(RoundScore {
            total,
            category: ScoreCategory::from_score(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(role: Role, content: &str) -> TranscriptMessage {
        TranscriptMessage {
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn prompt_labels_both_speakers() {
        let transcript = [
            message(Role::Assistant, "What's the challenge?"),
            message(Role::User, "We need to grow revenue"),
        ];
        let prompt = AnthropicScorer::scoring_prompt(&transcript);
        assert!(prompt.contains("Agent: What's the challenge?"));
        assert!(prompt.contains("Prospect: We need to grow revenue"));
        assert!(prompt.contains("totalScore"));
        assert!(prompt.contains("ONLY valid JSON"));
    }

    #[test]
    fn score_payload_parses_plain_json() {
        let payload: ScorePayload = serde_json::from_str(r#"{"totalScore": 85}"#).unwrap();
        assert_eq!(payload.total_score, 85);
    }

    #[test]
    fn out_of_range_score_clamps() {
        let payload: ScorePayload = serde_json::from_str(r#"{"totalScore": 400}"#).unwrap();
        let total = payload.total_score.min(100) as u8;
        assert_eq!(total, 100);
    }
}
