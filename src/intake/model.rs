//! Prospect and conversation-round data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A business prospect going through qualification.
///
/// Created at session start; mutated only by intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospect {
    pub id: Uuid,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Prospect {
    pub fn new(company_name: &str, contact_name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.to_string(),
            contact_name: contact_name.map(String::from),
            email: email.map(String::from),
            created_at: Utc::now(),
        }
    }
}

/// The four intake steps within a round.
///
/// Progresses linearly: Problem → Solution → Urgency → Budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Problem,
    Solution,
    Urgency,
    Budget,
}

impl Step {
    pub const TOTAL: u8 = 4;

    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Self::Problem => 1,
            Self::Solution => 2,
            Self::Urgency => 3,
            Self::Budget => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Self::Problem),
            2 => Some(Self::Solution),
            3 => Some(Self::Urgency),
            4 => Some(Self::Budget),
            _ => None,
        }
    }

    /// Next step in the linear progression, if any.
    pub fn next(&self) -> Option<Step> {
        match self {
            Self::Problem => Some(Self::Solution),
            Self::Solution => Some(Self::Urgency),
            Self::Urgency => Some(Self::Budget),
            Self::Budget => None,
        }
    }

    /// Fields that must be non-null before this step is complete.
    pub fn required_fields(&self) -> &'static [FieldName] {
        match self {
            Self::Problem => &[
                FieldName::ProblemType,
                FieldName::JobFunction,
                FieldName::Industry,
            ],
            Self::Solution => &[FieldName::SolutionType],
            Self::Urgency => &[FieldName::Timeline],
            Self::Budget => &[FieldName::BudgetStatus],
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Problem => "problem",
            Self::Solution => "solution",
            Self::Urgency => "urgency",
            Self::Budget => "budget",
        };
        write!(f, "{s}")
    }
}

/// Names of the structured fields the intake can capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    ProblemType,
    JobFunction,
    Industry,
    SolutionType,
    Timeline,
    BudgetStatus,
}

impl FieldName {
    pub const ALL: [FieldName; 6] = [
        Self::ProblemType,
        Self::JobFunction,
        Self::Industry,
        Self::SolutionType,
        Self::Timeline,
        Self::BudgetStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProblemType => "problemType",
            Self::JobFunction => "jobFunction",
            Self::Industry => "industry",
            Self::SolutionType => "solutionType",
            Self::Timeline => "timeline",
            Self::BudgetStatus => "budgetStatus",
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accumulated structured fields extracted from the conversation.
///
/// Entries are never deleted, only added or overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_status: Option<String>,
}

impl ExtractedFields {
    pub fn get(&self, field: FieldName) -> Option<&str> {
        let slot = match field {
            FieldName::ProblemType => &self.problem_type,
            FieldName::JobFunction => &self.job_function,
            FieldName::Industry => &self.industry,
            FieldName::SolutionType => &self.solution_type,
            FieldName::Timeline => &self.timeline,
            FieldName::BudgetStatus => &self.budget_status,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, field: FieldName, value: String) {
        let slot = match field {
            FieldName::ProblemType => &mut self.problem_type,
            FieldName::JobFunction => &mut self.job_function,
            FieldName::Industry => &mut self.industry,
            FieldName::SolutionType => &mut self.solution_type,
            FieldName::Timeline => &mut self.timeline,
            FieldName::BudgetStatus => &mut self.budget_status,
        };
        *slot = Some(value);
    }

    /// Merge `update` into self.
    ///
    /// Non-null values overwrite (last write wins); absent values never
    /// erase an existing one.
    pub fn merge(&mut self, update: &ExtractedFields) {
        for field in FieldName::ALL {
            if let Some(value) = update.get(field) {
                self.set(field, value.to_string());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        FieldName::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// First field in `fields` that is still null, if any.
    pub fn first_missing(&self, fields: &[FieldName]) -> Option<FieldName> {
        fields.iter().copied().find(|f| self.get(*f).is_none())
    }

    pub fn satisfies(&self, fields: &[FieldName]) -> bool {
        self.first_missing(fields).is_none()
    }
}

/// Score assigned to a completed round by the scoring collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    /// 0–100.
    pub total: u8,
    pub category: ScoreCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Strong,
    Moderate,
    Weak,
}

impl ScoreCategory {
    /// Derived from the numeric score; the gate reads only the number.
    pub fn from_score(total: u8) -> Self {
        if total >= 75 {
            Self::Strong
        } else if total >= 50 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
        }
    }
}

impl std::fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Round lifecycle.
///
/// Invalid step/status combinations are unrepresentable: only an in-progress
/// round carries a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundState {
    NotStarted,
    InProgress { step: Step },
    Completed,
}

impl RoundState {
    pub fn status_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress { .. } => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Step number for display: 1 before the round starts, the live step
    /// while in progress, the final step once completed.
    pub fn current_step(&self) -> u8 {
        match self {
            Self::NotStarted => 1,
            Self::InProgress { step } => step.number(),
            Self::Completed => Step::TOTAL,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// One qualification conversation (round 1..=3) for a prospect.
///
/// The round id doubles as the session token for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRound {
    pub id: Uuid,
    pub prospect_id: Uuid,
    pub round_number: u8,
    pub state: RoundState,
    pub extracted: ExtractedFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<RoundScore>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ConversationRound {
    /// Start a new round at the first step.
    pub fn new(prospect_id: Uuid, round_number: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            prospect_id,
            round_number,
            state: RoundState::InProgress { step: Step::Problem },
            extracted: ExtractedFields::default(),
            score: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the round completed. Callers must have verified that every
    /// required field of the final step is satisfied.
    pub fn complete(&mut self) {
        self.state = RoundState::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_completed()
    }

    /// Progress through the round: 25% per completed step.
    pub fn progress_percent(&self) -> u8 {
        match self.state {
            RoundState::NotStarted => 0,
            RoundState::InProgress { step } => (step.number() - 1) * (100 / Step::TOTAL),
            RoundState::Completed => 100,
        }
    }
}

/// One transcript entry. The transcript is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TranscriptMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Role {
        match s {
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
