//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intake::model::{
    ConversationRound, ExtractedFields, Prospect, Role, RoundScore, RoundState, ScoreCategory,
    Step, TranscriptMessage,
};
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn opt_text(s: Option<String>) -> libsql::Value {
    match s {
        Some(v) => libsql::Value::Text(v),
        None => libsql::Value::Null,
    }
}

fn parse_category(s: &str, total: u8) -> ScoreCategory {
    match s {
        "strong" => ScoreCategory::Strong,
        "moderate" => ScoreCategory::Moderate,
        "weak" => ScoreCategory::Weak,
        _ => ScoreCategory::from_score(total),
    }
}

fn round_state(status: &str, step: i64) -> RoundState {
    match status {
        "completed" => RoundState::Completed,
        "in_progress" => RoundState::InProgress {
            step: Step::from_number(step as u8).unwrap_or(Step::Problem),
        },
        _ => RoundState::NotStarted,
    }
}

const ROUND_COLUMNS: &str = "id, prospect_id, round_number, status, current_step, \
                             extracted_data, score, score_category, started_at, completed_at";

/// Map a libsql Row to a ConversationRound. Column order matches
/// ROUND_COLUMNS.
fn row_to_round(row: &libsql::Row) -> Result<ConversationRound, libsql::Error> {
    let id: String = row.get(0)?;
    let prospect_id: String = row.get(1)?;
    let round_number: i64 = row.get(2)?;
    let status: String = row.get(3)?;
    let step: i64 = row.get(4)?;
    let extracted_json: String = row.get(5)?;
    let score_total: Option<i64> = row.get::<i64>(6).ok();
    let score_category: Option<String> = row.get::<String>(7).ok();
    let started: String = row.get(8)?;
    let completed: Option<String> = row.get::<String>(9).ok();

    let extracted: ExtractedFields =
        serde_json::from_str(&extracted_json).unwrap_or_default();

    let score = score_total.map(|total| {
        let total = total.clamp(0, 100) as u8;
        RoundScore {
            total,
            category: parse_category(score_category.as_deref().unwrap_or(""), total),
        }
    });

    Ok(ConversationRound {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        prospect_id: Uuid::parse_str(&prospect_id).unwrap_or_else(|_| Uuid::nil()),
        round_number: round_number as u8,
        state: round_state(&status, step),
        extracted,
        score,
        started_at: parse_datetime(&started),
        completed_at: completed.map(|s| parse_datetime(&s)),
    })
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Prospects ───────────────────────────────────────────────────

    async fn insert_prospect(&self, prospect: &Prospect) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO prospects (id, company_name, contact_name, email, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    prospect.id.to_string(),
                    prospect.company_name.clone(),
                    opt_text(prospect.contact_name.clone()),
                    opt_text(prospect.email.clone()),
                    prospect.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_prospect: {e}")))?;

        debug!(prospect_id = %prospect.id, company = %prospect.company_name, "Prospect inserted");
        Ok(())
    }

    async fn get_prospect(&self, id: Uuid) -> Result<Option<Prospect>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, company_name, contact_name, email, created_at \
                 FROM prospects WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_prospect: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let id_str: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_prospect row: {e}")))?;
                let company_name: String = row
                    .get(1)
                    .map_err(|e| DatabaseError::Query(format!("get_prospect row: {e}")))?;
                let contact_name: Option<String> = row.get::<String>(2).ok();
                let email: Option<String> = row.get::<String>(3).ok();
                let created: String = row
                    .get(4)
                    .map_err(|e| DatabaseError::Query(format!("get_prospect row: {e}")))?;

                Ok(Some(Prospect {
                    id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
                    company_name,
                    contact_name,
                    email,
                    created_at: parse_datetime(&created),
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_prospect: {e}"))),
        }
    }

    // ── Rounds ──────────────────────────────────────────────────────

    async fn insert_round(&self, round: &ConversationRound) -> Result<(), DatabaseError> {
        let extracted_json = serde_json::to_string(&round.extracted)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO rounds (id, prospect_id, round_number, status, current_step, \
                 extracted_data, started_at, completed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    round.id.to_string(),
                    round.prospect_id.to_string(),
                    i64::from(round.round_number),
                    round.state.status_str(),
                    i64::from(round.state.current_step()),
                    extracted_json,
                    round.started_at.to_rfc3339(),
                    opt_text(round.completed_at.map(|t| t.to_rfc3339())),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_round: {e}")))?;

        debug!(round_id = %round.id, round = round.round_number, "Round inserted");
        Ok(())
    }

    async fn get_round(&self, id: Uuid) -> Result<Option<ConversationRound>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ROUND_COLUMNS} FROM rounds WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_round: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let round = row_to_round(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_round row parse: {e}")))?;
                Ok(Some(round))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_round: {e}"))),
        }
    }

    async fn latest_round_for_prospect(
        &self,
        prospect_id: Uuid,
    ) -> Result<Option<ConversationRound>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {ROUND_COLUMNS} FROM rounds WHERE prospect_id = ?1 \
                     ORDER BY round_number DESC LIMIT 1"
                ),
                params![prospect_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("latest_round_for_prospect: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let round = row_to_round(&row).map_err(|e| {
                    DatabaseError::Query(format!("latest_round_for_prospect row parse: {e}"))
                })?;
                Ok(Some(round))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("latest_round_for_prospect: {e}"))),
        }
    }

    async fn round_by_number(
        &self,
        prospect_id: Uuid,
        round_number: u8,
    ) -> Result<Option<ConversationRound>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {ROUND_COLUMNS} FROM rounds \
                     WHERE prospect_id = ?1 AND round_number = ?2"
                ),
                params![prospect_id.to_string(), i64::from(round_number)],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("round_by_number: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let round = row_to_round(&row)
                    .map_err(|e| DatabaseError::Query(format!("round_by_number row parse: {e}")))?;
                Ok(Some(round))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("round_by_number: {e}"))),
        }
    }

    async fn save_round(&self, round: &ConversationRound) -> Result<(), DatabaseError> {
        let extracted_json = serde_json::to_string(&round.extracted)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "UPDATE rounds SET status = ?1, current_step = ?2, extracted_data = ?3, \
                 completed_at = ?4 WHERE id = ?5",
                params![
                    round.state.status_str(),
                    i64::from(round.state.current_step()),
                    extracted_json,
                    opt_text(round.completed_at.map(|t| t.to_rfc3339())),
                    round.id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_round: {e}")))?;

        debug!(round_id = %round.id, status = round.state.status_str(), "Round saved");
        Ok(())
    }

    async fn set_round_score(
        &self,
        round_id: Uuid,
        score: RoundScore,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "UPDATE rounds SET score = ?1, score_category = ?2 WHERE id = ?3",
                params![
                    i64::from(score.total),
                    score.category.as_str(),
                    round_id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_round_score: {e}")))?;

        debug!(round_id = %round_id, total = score.total, "Round score recorded");
        Ok(())
    }

    // ── Transcript ──────────────────────────────────────────────────

    async fn append_transcript(
        &self,
        round_id: Uuid,
        message: &TranscriptMessage,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO transcript_messages (id, round_id, role, content, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    Uuid::new_v4().to_string(),
                    round_id.to_string(),
                    message.role.as_str(),
                    message.content.clone(),
                    message.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_transcript: {e}")))?;
        Ok(())
    }

    async fn list_transcript(
        &self,
        round_id: Uuid,
    ) -> Result<Vec<TranscriptMessage>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT role, content, created_at FROM transcript_messages \
                 WHERE round_id = ?1 ORDER BY rowid",
                params![round_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_transcript: {e}")))?;

        let mut messages = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let role: String = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("list_transcript row: {e}")))?;
            let content: String = row
                .get(1)
                .map_err(|e| DatabaseError::Query(format!("list_transcript row: {e}")))?;
            let created: String = row
                .get(2)
                .map_err(|e| DatabaseError::Query(format!("list_transcript row: {e}")))?;
            messages.push(TranscriptMessage {
                role: Role::parse(&role),
                content,
                created_at: parse_datetime(&created),
            });
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::model::FieldName;

    async fn backend() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn sample_prospect() -> Prospect {
        Prospect::new("Acme Health", Some("Dana Reyes"), Some("dana@acme.test"))
    }

    #[tokio::test]
    async fn prospect_roundtrip() {
        let db = backend().await;
        let prospect = sample_prospect();
        db.insert_prospect(&prospect).await.unwrap();

        let loaded = db.get_prospect(prospect.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, prospect.id);
        assert_eq!(loaded.company_name, "Acme Health");
        assert_eq!(loaded.contact_name.as_deref(), Some("Dana Reyes"));
        assert_eq!(loaded.email.as_deref(), Some("dana@acme.test"));
    }

    #[tokio::test]
    async fn missing_prospect_is_none() {
        let db = backend().await;
        assert!(db.get_prospect(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prospect_with_null_contact_fields() {
        let db = backend().await;
        let prospect = Prospect::new("Solo LLC", None, None);
        db.insert_prospect(&prospect).await.unwrap();

        let loaded = db.get_prospect(prospect.id).await.unwrap().unwrap();
        assert!(loaded.contact_name.is_none());
        assert!(loaded.email.is_none());
    }

    #[tokio::test]
    async fn round_roundtrip_preserves_state_and_fields() {
        let db = backend().await;
        let prospect = sample_prospect();
        db.insert_prospect(&prospect).await.unwrap();

        let mut round = ConversationRound::new(prospect.id, 1);
        round.extracted.set(FieldName::Industry, "healthcare".into());
        db.insert_round(&round).await.unwrap();

        let loaded = db.get_round(round.id).await.unwrap().unwrap();
        assert_eq!(loaded.prospect_id, prospect.id);
        assert_eq!(loaded.round_number, 1);
        assert_eq!(loaded.state, RoundState::InProgress { step: Step::Problem });
        assert_eq!(loaded.extracted.industry.as_deref(), Some("healthcare"));
        assert!(loaded.score.is_none());
        assert!(loaded.completed_at.is_none());
    }

    #[tokio::test]
    async fn save_round_updates_mutable_state() {
        let db = backend().await;
        let prospect = sample_prospect();
        db.insert_prospect(&prospect).await.unwrap();

        let mut round = ConversationRound::new(prospect.id, 1);
        db.insert_round(&round).await.unwrap();

        round.state = RoundState::InProgress { step: Step::Urgency };
        round.extracted.set(FieldName::SolutionType, "software".into());
        db.save_round(&round).await.unwrap();

        let loaded = db.get_round(round.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, RoundState::InProgress { step: Step::Urgency });
        assert_eq!(loaded.extracted.solution_type.as_deref(), Some("software"));

        round.complete();
        db.save_round(&round).await.unwrap();
        let loaded = db.get_round(round.id).await.unwrap().unwrap();
        assert!(loaded.is_complete());
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn score_persists() {
        let db = backend().await;
        let prospect = sample_prospect();
        db.insert_prospect(&prospect).await.unwrap();

        let mut round = ConversationRound::new(prospect.id, 1);
        round.complete();
        db.insert_round(&round).await.unwrap();

        db.set_round_score(
            round.id,
            RoundScore {
                total: 72,
                category: ScoreCategory::Moderate,
            },
        )
        .await
        .unwrap();

        let loaded = db.get_round(round.id).await.unwrap().unwrap();
        let score = loaded.score.unwrap();
        assert_eq!(score.total, 72);
        assert_eq!(score.category, ScoreCategory::Moderate);
    }

    #[tokio::test]
    async fn latest_and_by_number_lookups() {
        let db = backend().await;
        let prospect = sample_prospect();
        db.insert_prospect(&prospect).await.unwrap();

        let mut r1 = ConversationRound::new(prospect.id, 1);
        r1.complete();
        db.insert_round(&r1).await.unwrap();
        let r2 = ConversationRound::new(prospect.id, 2);
        db.insert_round(&r2).await.unwrap();

        let latest = db.latest_round_for_prospect(prospect.id).await.unwrap().unwrap();
        assert_eq!(latest.round_number, 2);
        assert_eq!(latest.id, r2.id);

        let first = db.round_by_number(prospect.id, 1).await.unwrap().unwrap();
        assert_eq!(first.id, r1.id);
        assert!(first.is_complete());

        assert!(db.round_by_number(prospect.id, 3).await.unwrap().is_none());
        assert!(
            db.latest_round_for_prospect(Uuid::new_v4())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_round_number_rejected() {
        let db = backend().await;
        let prospect = sample_prospect();
        db.insert_prospect(&prospect).await.unwrap();

        db.insert_round(&ConversationRound::new(prospect.id, 1))
            .await
            .unwrap();
        let duplicate = ConversationRound::new(prospect.id, 1);
        assert!(db.insert_round(&duplicate).await.is_err());
    }

    #[tokio::test]
    async fn transcript_preserves_insertion_order() {
        let db = backend().await;
        let prospect = sample_prospect();
        db.insert_prospect(&prospect).await.unwrap();
        let round = ConversationRound::new(prospect.id, 1);
        db.insert_round(&round).await.unwrap();

        db.append_transcript(round.id, &TranscriptMessage::assistant("Welcome!"))
            .await
            .unwrap();
        db.append_transcript(round.id, &TranscriptMessage::user("We're in healthcare"))
            .await
            .unwrap();
        db.append_transcript(round.id, &TranscriptMessage::assistant("Which role?"))
            .await
            .unwrap();

        let transcript = db.list_transcript(round.id).await.unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, Role::Assistant);
        assert_eq!(transcript[0].content, "Welcome!");
        assert_eq!(transcript[1].role, Role::User);
        assert_eq!(transcript[2].content, "Which role?");
    }

    #[tokio::test]
    async fn empty_transcript_is_empty_vec() {
        let db = backend().await;
        let transcript = db.list_transcript(Uuid::new_v4()).await.unwrap();
        assert!(transcript.is_empty());
    }
}
