//! Round eligibility gate.
//!
//! Decides whether a prospect may begin round N+1 based on round N's score
//! and elapsed time since its completion. Read-only: inspects state, never
//! mutates it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::GateConfig;

use super::model::ConversationRound;

/// Why a round is or isn't available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    ConversationNotFound,
    ScoreBelowMinimum,
    TooSoon,
    RequirementsMet,
}

impl GateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConversationNotFound => "conversation_not_found",
            Self::ScoreBelowMinimum => "score_below_minimum",
            Self::TooSoon => "too_soon",
            Self::RequirementsMet => "requirements_met",
        }
    }
}

impl std::fmt::Display for GateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gate verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: GateReason,
}

impl Eligibility {
    pub fn met() -> Self {
        Self {
            eligible: true,
            reason: GateReason::RequirementsMet,
        }
    }

    pub fn rejected(reason: GateReason) -> Self {
        Self {
            eligible: false,
            reason,
        }
    }
}

/// Check whether `requested_round` may begin.
///
/// `previous` is the immediately preceding round, if any. A previous round
/// that never completed (or is missing entirely) reports
/// `conversation_not_found`; a completed round without a recorded score
/// reports `score_below_minimum` — an unscored round never opens the gate.
/// Score is checked before elapsed time.
pub fn check_eligibility(
    config: &GateConfig,
    requested_round: u8,
    previous: Option<&ConversationRound>,
    now: DateTime<Utc>,
) -> Eligibility {
    let Some(policy) = config.policy_for(requested_round) else {
        // Ungated round (round 1).
        return Eligibility::met();
    };

    let Some(previous) = previous else {
        return Eligibility::rejected(GateReason::ConversationNotFound);
    };
    let Some(completed_at) = previous.completed_at.filter(|_| previous.is_complete()) else {
        return Eligibility::rejected(GateReason::ConversationNotFound);
    };

    match previous.score {
        Some(score) if score.total >= policy.min_previous_score => {}
        _ => return Eligibility::rejected(GateReason::ScoreBelowMinimum),
    }

    if now - completed_at < Duration::hours(policy.min_hours_elapsed) {
        return Eligibility::rejected(GateReason::TooSoon);
    }

    Eligibility::met()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::model::{RoundScore, ScoreCategory};
    use uuid::Uuid;

    fn completed_round(score: Option<u8>, hours_ago: i64) -> ConversationRound {
        let mut round = ConversationRound::new(Uuid::new_v4(), 1);
        round.complete();
        round.completed_at = Some(Utc::now() - Duration::hours(hours_ago));
        round.score = score.map(|total| RoundScore {
            total,
            category: ScoreCategory::from_score(total),
        });
        round
    }

    #[test]
    fn round_one_is_ungated() {
        let config = GateConfig::default();
        let verdict = check_eligibility(&config, 1, None, Utc::now());
        assert!(verdict.eligible);
        assert_eq!(verdict.reason, GateReason::RequirementsMet);
    }

    #[test]
    fn round_two_rejected_below_minimum_score() {
        let config = GateConfig::default();
        let prev = completed_round(Some(50), 100);
        let verdict = check_eligibility(&config, 2, Some(&prev), Utc::now());
        assert!(!verdict.eligible);
        assert_eq!(verdict.reason, GateReason::ScoreBelowMinimum);
    }

    #[test]
    fn round_two_accepted_at_threshold() {
        let config = GateConfig::default();
        let prev = completed_round(Some(60), 48);
        let verdict = check_eligibility(&config, 2, Some(&prev), Utc::now());
        assert!(verdict.eligible);
        assert_eq!(verdict.reason, GateReason::RequirementsMet);
    }

    #[test]
    fn round_two_rejected_too_soon() {
        let config = GateConfig::default();
        let prev = completed_round(Some(90), 24);
        let verdict = check_eligibility(&config, 2, Some(&prev), Utc::now());
        assert!(!verdict.eligible);
        assert_eq!(verdict.reason, GateReason::TooSoon);
    }

    #[test]
    fn score_checked_before_elapsed_time() {
        // Both conditions fail; score wins.
        let config = GateConfig::default();
        let prev = completed_round(Some(10), 1);
        let verdict = check_eligibility(&config, 2, Some(&prev), Utc::now());
        assert_eq!(verdict.reason, GateReason::ScoreBelowMinimum);
    }

    #[test]
    fn missing_previous_round_rejected() {
        let config = GateConfig::default();
        let verdict = check_eligibility(&config, 2, None, Utc::now());
        assert!(!verdict.eligible);
        assert_eq!(verdict.reason, GateReason::ConversationNotFound);
    }

    #[test]
    fn incomplete_previous_round_rejected() {
        let config = GateConfig::default();
        let prev = ConversationRound::new(Uuid::new_v4(), 1);
        let verdict = check_eligibility(&config, 2, Some(&prev), Utc::now());
        assert_eq!(verdict.reason, GateReason::ConversationNotFound);
    }

    #[test]
    fn unscored_previous_round_rejected() {
        let config = GateConfig::default();
        let prev = completed_round(None, 100);
        let verdict = check_eligibility(&config, 2, Some(&prev), Utc::now());
        assert_eq!(verdict.reason, GateReason::ScoreBelowMinimum);
    }

    #[test]
    fn round_three_uses_its_own_policy() {
        let config = GateConfig::default();

        let prev = completed_round(Some(55), 72);
        let verdict = check_eligibility(&config, 3, Some(&prev), Utc::now());
        assert!(verdict.eligible);

        let prev = completed_round(Some(54), 200);
        let verdict = check_eligibility(&config, 3, Some(&prev), Utc::now());
        assert_eq!(verdict.reason, GateReason::ScoreBelowMinimum);

        let prev = completed_round(Some(70), 71);
        let verdict = check_eligibility(&config, 3, Some(&prev), Utc::now());
        assert_eq!(verdict.reason, GateReason::TooSoon);
    }

    #[test]
    fn gate_does_not_mutate_previous_round() {
        let config = GateConfig::default();
        let prev = completed_round(Some(60), 48);
        let snapshot = prev.clone();
        let _ = check_eligibility(&config, 2, Some(&prev), Utc::now());
        assert_eq!(prev.completed_at, snapshot.completed_at);
        assert_eq!(prev.score, snapshot.score);
        assert_eq!(prev.state, snapshot.state);
    }
}
