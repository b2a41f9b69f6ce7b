//! Unified `Database` trait — single async interface for all persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intake::model::{ConversationRound, Prospect, RoundScore, TranscriptMessage};

/// Backend-agnostic database trait covering prospects, rounds, and
/// transcripts. Each call is atomic; transaction semantics across calls are
/// not provided here.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Prospects ───────────────────────────────────────────────────

    async fn insert_prospect(&self, prospect: &Prospect) -> Result<(), DatabaseError>;

    async fn get_prospect(&self, id: Uuid) -> Result<Option<Prospect>, DatabaseError>;

    // ── Rounds ──────────────────────────────────────────────────────

    /// Insert a newly started round.
    async fn insert_round(&self, round: &ConversationRound) -> Result<(), DatabaseError>;

    /// Look up a round by its conversation id.
    async fn get_round(&self, id: Uuid) -> Result<Option<ConversationRound>, DatabaseError>;

    /// The prospect's most recent round, by round number.
    async fn latest_round_for_prospect(
        &self,
        prospect_id: Uuid,
    ) -> Result<Option<ConversationRound>, DatabaseError>;

    /// A specific round of a prospect.
    async fn round_by_number(
        &self,
        prospect_id: Uuid,
        round_number: u8,
    ) -> Result<Option<ConversationRound>, DatabaseError>;

    /// Persist a round's mutable state: status, step, extracted fields,
    /// completion time.
    async fn save_round(&self, round: &ConversationRound) -> Result<(), DatabaseError>;

    /// Record the score of a completed round.
    async fn set_round_score(
        &self,
        round_id: Uuid,
        score: RoundScore,
    ) -> Result<(), DatabaseError>;

    // ── Transcript ──────────────────────────────────────────────────

    /// Append one message to a round's transcript.
    async fn append_transcript(
        &self,
        round_id: Uuid,
        message: &TranscriptMessage,
    ) -> Result<(), DatabaseError>;

    /// The round's transcript in insertion order.
    async fn list_transcript(
        &self,
        round_id: Uuid,
    ) -> Result<Vec<TranscriptMessage>, DatabaseError>;
}
