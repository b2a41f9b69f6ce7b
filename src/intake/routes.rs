//! REST endpoints for the qualification flow.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;
use uuid::Uuid;

use crate::error::{Error, IntakeError};

use super::gate::Eligibility;
use super::model::{ExtractedFields, RoundScore};
use super::quality::QualityReport;
use super::service::{IntakeService, StartRequest};

/// Shared state for intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub service: Arc<IntakeService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartBody {
    #[serde(default)]
    prospect_id: Option<Uuid>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    contact_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartReply {
    conversation_id: Uuid,
    prospect_id: Uuid,
    question: String,
    current_step: u8,
    total_steps: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RespondBody {
    #[serde(default)]
    response_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RespondReply {
    question: String,
    is_follow_up: bool,
    section_complete: bool,
    current_step: u8,
    progress: u8,
    is_complete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReply {
    current_step: u8,
    total_steps: u8,
    status: &'static str,
    extracted_data: ExtractedFields,
    progress: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultsReply {
    extracted_data: ExtractedFields,
    data_quality: QualityReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<RoundScore>,
}

/// Error wrapper mapping the service taxonomy onto HTTP statuses.
struct ApiError(Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::Intake(IntakeError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, json!({"error": self.0.to_string()}))
            }
            Error::Intake(
                IntakeError::ConversationNotFound { .. } | IntakeError::ProspectNotFound { .. },
            ) => (StatusCode::NOT_FOUND, json!({"error": self.0.to_string()})),
            Error::Intake(IntakeError::NotCompleted { progress }) => (
                StatusCode::CONFLICT,
                json!({"error": self.0.to_string(), "progress": progress}),
            ),
            Error::Intake(
                IntakeError::RoundNotEligible { .. } | IntakeError::AllRoundsCompleted { .. },
            ) => (StatusCode::CONFLICT, json!({"error": self.0.to_string()})),
            Error::Score(_) => {
                error!("Upstream scoring failure: {}", self.0);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({"error": "upstream collaborator failure"}),
                )
            }
            _ => {
                error!("Internal error: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "internal error"}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// POST /api/qualification/start
async fn start(
    State(state): State<IntakeRouteState>,
    Json(body): Json<StartBody>,
) -> Result<Json<StartReply>, ApiError> {
    let started = state
        .service
        .start_qualification(StartRequest {
            prospect_id: body.prospect_id,
            company_name: body.company_name,
            contact_name: body.contact_name,
            email: body.email,
        })
        .await?;

    Ok(Json(StartReply {
        conversation_id: started.conversation_id,
        prospect_id: started.prospect_id,
        question: started.question,
        current_step: started.current_step,
        total_steps: started.total_steps,
    }))
}

/// POST /api/qualification/{conversation_id}/respond
async fn respond(
    State(state): State<IntakeRouteState>,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<RespondBody>,
) -> Result<Json<RespondReply>, ApiError> {
    let reply = state
        .service
        .submit_response(conversation_id, &body.response_text)
        .await?;

    Ok(Json(RespondReply {
        question: reply.outcome.question,
        is_follow_up: reply.outcome.is_follow_up,
        section_complete: reply.outcome.section_complete,
        current_step: reply.outcome.current_step,
        progress: reply.progress,
        is_complete: reply.outcome.is_complete,
    }))
}

/// GET /api/qualification/{conversation_id}/status
async fn status(
    State(state): State<IntakeRouteState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<StatusReply>, ApiError> {
    let status = state.service.get_status(conversation_id).await?;
    Ok(Json(StatusReply {
        current_step: status.current_step,
        total_steps: status.total_steps,
        status: status.status,
        extracted_data: status.extracted,
        progress: status.progress,
    }))
}

/// GET /api/qualification/{conversation_id}/results
///
/// 409 with current progress until the round completes.
async fn results(
    State(state): State<IntakeRouteState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ResultsReply>, ApiError> {
    let results = state.service.get_results(conversation_id).await?;
    Ok(Json(ResultsReply {
        extracted_data: results.extracted,
        data_quality: results.data_quality,
        score: results.score,
    }))
}

/// GET /api/prospects/{prospect_id}/eligibility/{round}
async fn eligibility(
    State(state): State<IntakeRouteState>,
    Path((prospect_id, round)): Path<(Uuid, u8)>,
) -> Result<Json<Eligibility>, ApiError> {
    let verdict = state.service.check_eligibility(prospect_id, round).await?;
    Ok(Json(verdict))
}

/// Build the intake REST routes.
pub fn intake_routes(state: IntakeRouteState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/qualification/start", post(start))
        .route("/api/qualification/{conversation_id}/respond", post(respond))
        .route("/api/qualification/{conversation_id}/status", get(status))
        .route("/api/qualification/{conversation_id}/results", get(results))
        .route(
            "/api/prospects/{prospect_id}/eligibility/{round}",
            get(eligibility),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
