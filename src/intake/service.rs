//! IntakeService — coordinates rounds, extraction, gating, scoring, and
//! persistence.
//!
//! One turn: load session state, run the extractor/stepper, append the
//! transcript, persist, respond. At most one in-flight turn per session is
//! assumed; per-call storage atomicity is the only write protection.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GateConfig;
use crate::error::{IntakeError, Result};
use crate::scoring::ScoreProvider;
use crate::store::Database;

use super::extractor::Extractor;
use super::gate::{self, Eligibility, GateReason};
use super::model::{
    ConversationRound, ExtractedFields, Prospect, RoundScore, RoundState, Step, TranscriptMessage,
};
use super::prompts;
use super::quality::{self, QualityReport};
use super::stepper::{self, StepOutcome};

/// Reply to a start request.
#[derive(Debug, Clone)]
pub struct StartedQualification {
    pub conversation_id: Uuid,
    pub prospect_id: Uuid,
    pub question: String,
    pub current_step: u8,
    pub total_steps: u8,
}

/// Reply to a submitted response.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub outcome: StepOutcome,
    pub progress: u8,
}

/// Current state of a conversation.
#[derive(Debug, Clone)]
pub struct ConversationStatus {
    pub current_step: u8,
    pub total_steps: u8,
    pub status: &'static str,
    pub extracted: ExtractedFields,
    pub progress: u8,
}

/// Final output of a completed round.
#[derive(Debug, Clone)]
pub struct QualificationResults {
    pub extracted: ExtractedFields,
    pub data_quality: QualityReport,
    pub score: Option<RoundScore>,
}

/// Request to start (or resume) qualification.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub prospect_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
}

pub struct IntakeService {
    db: Arc<dyn Database>,
    extractor: Arc<dyn Extractor>,
    scorer: Option<Arc<dyn ScoreProvider>>,
    gate_config: GateConfig,
}

impl IntakeService {
    pub fn new(
        db: Arc<dyn Database>,
        extractor: Arc<dyn Extractor>,
        scorer: Option<Arc<dyn ScoreProvider>>,
        gate_config: GateConfig,
    ) -> Self {
        Self {
            db,
            extractor,
            scorer,
            gate_config,
        }
    }

    /// Start qualification for a prospect.
    ///
    /// Creates the prospect on first contact. If a round is already live,
    /// re-enters it (re-issuing the current step's opening question) instead
    /// of creating a new one. Starting round N+1 is subject to the round
    /// gate.
    pub async fn start_qualification(&self, req: StartRequest) -> Result<StartedQualification> {
        let prospect = self.resolve_prospect(&req).await?;

        let latest = self.db.latest_round_for_prospect(prospect.id).await?;
        let round = match latest {
            Some(existing) if !existing.is_complete() => {
                let step = match existing.state {
                    RoundState::InProgress { step } => step,
                    _ => Step::Problem,
                };
                return Ok(StartedQualification {
                    conversation_id: existing.id,
                    prospect_id: prospect.id,
                    question: prompts::opening_question(step).to_string(),
                    current_step: existing.state.current_step(),
                    total_steps: Step::TOTAL,
                });
            }
            Some(completed) => {
                let next_round = completed.round_number + 1;
                if next_round > self.gate_config.max_rounds {
                    return Err(IntakeError::AllRoundsCompleted {
                        max: self.gate_config.max_rounds,
                    }
                    .into());
                }
                let verdict = gate::check_eligibility(
                    &self.gate_config,
                    next_round,
                    Some(&completed),
                    Utc::now(),
                );
                if !verdict.eligible {
                    return Err(IntakeError::RoundNotEligible {
                        round: next_round,
                        reason: verdict.reason.to_string(),
                    }
                    .into());
                }
                ConversationRound::new(prospect.id, next_round)
            }
            None => ConversationRound::new(prospect.id, 1),
        };

        self.db.insert_round(&round).await?;
        let question = prompts::opening_question(Step::Problem);
        self.db
            .append_transcript(round.id, &TranscriptMessage::assistant(question))
            .await?;

        info!(
            conversation_id = %round.id,
            prospect_id = %prospect.id,
            round = round.round_number,
            "Qualification round started"
        );

        Ok(StartedQualification {
            conversation_id: round.id,
            prospect_id: prospect.id,
            question: question.to_string(),
            current_step: 1,
            total_steps: Step::TOTAL,
        })
    }

    /// Process one prospect utterance.
    pub async fn submit_response(
        &self,
        conversation_id: Uuid,
        response_text: &str,
    ) -> Result<TurnReply> {
        let text = response_text.trim();
        if text.is_empty() {
            return Err(IntakeError::Validation {
                field: "responseText".into(),
                message: "must not be empty".into(),
            }
            .into());
        }

        let (round, history) = futures::try_join!(
            self.db.get_round(conversation_id),
            self.db.list_transcript(conversation_id),
        )?;
        let mut round = round.ok_or(IntakeError::ConversationNotFound {
            id: conversation_id,
        })?;

        if round.is_complete() {
            // Terminal state is sticky: report completion, touch nothing.
            let outcome = stepper::advance(&mut round, &history, self.extractor.as_ref(), text);
            return Ok(TurnReply {
                outcome,
                progress: 100,
            });
        }

        let outcome = stepper::advance(&mut round, &history, self.extractor.as_ref(), text);

        self.db.save_round(&round).await?;
        let user_message = TranscriptMessage::user(text);
        let reply_message = TranscriptMessage::assistant(&outcome.question);
        self.db.append_transcript(round.id, &user_message).await?;
        self.db.append_transcript(round.id, &reply_message).await?;

        if outcome.is_complete {
            info!(conversation_id = %round.id, round = round.round_number, "Round completed");
            let mut full_transcript = history;
            full_transcript.push(user_message);
            full_transcript.push(reply_message);
            self.score_round(&round, &full_transcript).await;
        }

        Ok(TurnReply {
            progress: round.progress_percent(),
            outcome,
        })
    }

    /// Current step, status, and captured fields for a conversation.
    pub async fn get_status(&self, conversation_id: Uuid) -> Result<ConversationStatus> {
        let round = self
            .db
            .get_round(conversation_id)
            .await?
            .ok_or(IntakeError::ConversationNotFound {
                id: conversation_id,
            })?;

        Ok(ConversationStatus {
            current_step: round.state.current_step(),
            total_steps: Step::TOTAL,
            status: round.state.status_str(),
            progress: round.progress_percent(),
            extracted: round.extracted,
        })
    }

    /// Extracted data and quality report for a completed round.
    ///
    /// Fails with the current progress while the round is still in flight so
    /// the caller can poll.
    pub async fn get_results(&self, conversation_id: Uuid) -> Result<QualificationResults> {
        let round = self
            .db
            .get_round(conversation_id)
            .await?
            .ok_or(IntakeError::ConversationNotFound {
                id: conversation_id,
            })?;

        if !round.is_complete() {
            return Err(IntakeError::NotCompleted {
                progress: round.progress_percent(),
            }
            .into());
        }

        let data_quality = quality::analyze(&round.extracted);
        Ok(QualificationResults {
            extracted: round.extracted,
            data_quality,
            score: round.score,
        })
    }

    /// Whether `requested_round` may begin for a prospect. Read-only.
    pub async fn check_eligibility(
        &self,
        prospect_id: Uuid,
        requested_round: u8,
    ) -> Result<Eligibility> {
        if requested_round == 0 || requested_round > self.gate_config.max_rounds {
            return Err(IntakeError::Validation {
                field: "round".into(),
                message: format!("must be between 1 and {}", self.gate_config.max_rounds),
            }
            .into());
        }

        if self.db.get_prospect(prospect_id).await?.is_none() {
            return Ok(Eligibility::rejected(GateReason::ConversationNotFound));
        }
        if requested_round == 1 {
            return Ok(Eligibility::met());
        }

        let previous = self
            .db
            .round_by_number(prospect_id, requested_round - 1)
            .await?;
        Ok(gate::check_eligibility(
            &self.gate_config,
            requested_round,
            previous.as_ref(),
            Utc::now(),
        ))
    }

    async fn resolve_prospect(&self, req: &StartRequest) -> Result<Prospect> {
        match req.prospect_id {
            Some(id) => Ok(self
                .db
                .get_prospect(id)
                .await?
                .ok_or(IntakeError::ProspectNotFound { id })?),
            None => {
                let company = req
                    .company_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| IntakeError::Validation {
                        field: "companyName".into(),
                        message: "required when prospectId is absent".into(),
                    })?;
                let prospect =
                    Prospect::new(company, req.contact_name.as_deref(), req.email.as_deref());
                self.db.insert_prospect(&prospect).await?;
                info!(prospect_id = %prospect.id, company = %prospect.company_name, "Prospect created");
                Ok(prospect)
            }
        }
    }

    /// Score a just-completed round. Failure leaves the round unscored and
    /// is retryable; it never fails the prospect's turn.
    async fn score_round(&self, round: &ConversationRound, transcript: &[TranscriptMessage]) {
        let Some(scorer) = &self.scorer else {
            warn!(conversation_id = %round.id, "No scorer configured, round left unscored");
            return;
        };

        match scorer.score(transcript).await {
            Ok(score) => {
                info!(conversation_id = %round.id, total = score.total, category = %score.category, "Round scored");
                if let Err(e) = self.db.set_round_score(round.id, score).await {
                    warn!(conversation_id = %round.id, "Failed to persist round score: {e}");
                }
            }
            Err(e) => {
                warn!(conversation_id = %round.id, "Scoring failed (round left unscored): {e}");
            }
        }
    }
}
