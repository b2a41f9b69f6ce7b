//! Error types for the qualification service.

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Scoring error: {0}")]
    Score(#[from] ScoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Intake flow errors — the caller-facing taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Conversation {id} not found")]
    ConversationNotFound { id: Uuid },

    #[error("Prospect {id} not found")]
    ProspectNotFound { id: Uuid },

    #[error("Qualification not completed ({progress}% progress)")]
    NotCompleted { progress: u8 },

    #[error("Round {round} not eligible: {reason}")]
    RoundNotEligible { round: u8, reason: String },

    #[error("All {max} qualification rounds are completed")]
    AllRoundsCompleted { max: u8 },
}

/// Scoring collaborator errors. Always retryable from the caller's side.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("Score request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid score response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
