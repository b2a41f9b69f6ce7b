//! Round scoring — the external collaborator that rates a completed round.

pub mod anthropic;

pub use anthropic::{AnthropicScorer, ScorerConfig};

use async_trait::async_trait;

use crate::error::ScoreError;
use crate::intake::model::{RoundScore, TranscriptMessage};

/// Scores a completed round's transcript.
///
/// May fail; failures are retryable and must never corrupt persisted round
/// state — callers leave the round unscored and move on.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    async fn score(&self, transcript: &[TranscriptMessage]) -> Result<RoundScore, ScoreError>;
}
