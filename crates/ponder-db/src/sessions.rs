//! Thinking session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use ponder_core::{
    Error, Result, SessionRepository, ThinkingCommand, ThinkingResult, ThinkingSession,
};

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_session_row(row: PgRow) -> Result<ThinkingSession> {
        let command: String = row.get("command");
        let command = command
            .parse::<ThinkingCommand>()
            .map_err(Error::Serialization)?;
        let output: JsonValue = row.get("output");
        let output: Vec<ThinkingResult> = serde_json::from_value(output)?;

        Ok(ThinkingSession {
            id: row.get("id"),
            note_id: row.get("note_id"),
            command,
            input: row.get("input"),
            output,
            saved_ids: row.get("saved_ids"),
            created_at_utc: row.get("created_at_utc"),
            expires_at_utc: row.get("expires_at_utc"),
        })
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &ThinkingSession) -> Result<()> {
        let output = serde_json::to_value(&session.output)?;

        sqlx::query(
            "INSERT INTO thinking_session
                (id, note_id, command, input, output, saved_ids, created_at_utc, expires_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(session.id)
        .bind(session.note_id)
        .bind(session.command.as_str())
        .bind(&session.input)
        .bind(output)
        .bind(&session.saved_ids)
        .bind(session.created_at_utc)
        .bind(session.expires_at_utc)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "sessions",
            op = "create",
            session_id = %session.id,
            command = %session.command,
            result_count = session.output.len(),
            "Thinking session stored"
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ThinkingSession>> {
        let row = sqlx::query(
            "SELECT id, note_id, command, input, output, saved_ids, created_at_utc, expires_at_utc
             FROM thinking_session
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_session_row).transpose()
    }

    async fn mark_saved(&self, session_id: Uuid, result_note_id: Uuid) -> Result<bool> {
        // Conditional append keeps saved_ids free of duplicates.
        let result = sqlx::query(
            "UPDATE thinking_session
             SET saved_ids = array_append(saved_ids, $2)
             WHERE id = $1 AND NOT ($2 = ANY(saved_ids))",
        )
        .bind(session_id)
        .bind(result_note_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM thinking_session WHERE expires_at_utc <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}
