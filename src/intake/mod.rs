//! Qualification intake — the staged conversation that turns free-text
//! answers into structured vendor-matching data.
//!
//! A round walks four steps (problem, solution, urgency, budget). Each turn
//! runs the field extractor over the prospect's utterance, merges the
//! proposals into the round's accumulator, and either asks a follow-up for
//! the first missing required field or advances to the next step. Up to
//! three rounds per prospect, spaced by the round gate.

pub mod extractor;
pub mod gate;
pub mod model;
pub mod prompts;
pub mod quality;
pub mod routes;
pub mod service;
pub mod stepper;

pub use extractor::{ExtractionRules, Extractor, KeywordExtractor};
pub use gate::{Eligibility, GateReason};
pub use model::{ConversationRound, ExtractedFields, Prospect, RoundState, Step};
pub use routes::{IntakeRouteState, intake_routes};
pub use service::IntakeService;
