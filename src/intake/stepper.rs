//! Qualification stepper — decides follow-up, advance, or completion.

use tracing::debug;

use super::extractor::Extractor;
use super::model::{ConversationRound, Role, RoundState, Step, TranscriptMessage};
use super::prompts;

/// Outcome of one stepper turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// The next question to put to the prospect.
    pub question: String,
    /// True when the question targets a missing field of the current step.
    pub is_follow_up: bool,
    /// True when this turn finished a step.
    pub section_complete: bool,
    /// 1-based step number after the turn.
    pub current_step: u8,
    /// True once all four steps are complete.
    pub is_complete: bool,
}

/// Advance a round by one user utterance.
///
/// Runs the extractor over the utterance merged with the round's prior user
/// messages, merges the proposals into the round's fields, then either
/// re-asks for the first missing required field or moves to the next step.
/// A turn that adds no new field information leaves the step and the
/// captured fields exactly where they were.
pub fn advance(
    round: &mut ConversationRound,
    history: &[TranscriptMessage],
    extractor: &dyn Extractor,
    utterance: &str,
) -> StepOutcome {
    let step = match round.state {
        RoundState::NotStarted => {
            round.state = RoundState::InProgress { step: Step::Problem };
            Step::Problem
        }
        RoundState::InProgress { step } => step,
        RoundState::Completed => {
            // Terminal state is sticky: re-submission reports completion
            // without touching the round.
            return StepOutcome {
                question: prompts::completion_message().to_string(),
                is_follow_up: false,
                section_complete: false,
                current_step: Step::TOTAL,
                is_complete: true,
            };
        }
    };

    let update = extractor.extract(&extraction_input(history, utterance));
    round.extracted.merge(&update);

    if let Some(missing) = round.extracted.first_missing(step.required_fields()) {
        debug!(step = step.number(), field = %missing, "Required field missing, asking follow-up");
        return StepOutcome {
            question: prompts::follow_up_question(missing).to_string(),
            is_follow_up: true,
            section_complete: false,
            current_step: step.number(),
            is_complete: false,
        };
    }

    match step.next() {
        Some(next) => {
            debug!(from = step.number(), to = next.number(), "Step complete, advancing");
            round.state = RoundState::InProgress { step: next };
            StepOutcome {
                question: prompts::opening_question(next).to_string(),
                is_follow_up: false,
                section_complete: true,
                current_step: next.number(),
                is_complete: false,
            }
        }
        None => {
            debug!(round = round.round_number, "Final step complete, round finished");
            round.complete();
            StepOutcome {
                question: prompts::completion_message().to_string(),
                is_follow_up: false,
                section_complete: true,
                current_step: Step::TOTAL,
                is_complete: true,
            }
        }
    }
}

/// Extraction input: the round's prior user turns plus the new utterance.
fn extraction_input(history: &[TranscriptMessage], utterance: &str) -> String {
    let mut text: String = history
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(utterance);
    text
}
