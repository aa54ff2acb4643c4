//! Note writer used when a thinking draft is promoted.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::info;
use uuid::Uuid;

use ponder_core::{new_v7, CreateNoteRequest, Error, NoteWriter, Result};

/// Link kind recorded for notes created from thinking sessions.
pub const THINKING_LINK_KIND: &str = "thinking";

/// Source recorded on notes created from thinking sessions.
pub const THINKING_NOTE_SOURCE: &str = "thinking";

/// PostgreSQL implementation of NoteWriter.
#[derive(Clone)]
pub struct PgNoteWriter {
    pool: Pool<Postgres>,
}

impl PgNoteWriter {
    /// Create a new PgNoteWriter with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteWriter for PgNoteWriter {
    async fn create_note(&self, req: CreateNoteRequest) -> Result<Uuid> {
        let note_id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO note (id, collection_id, title, content, source, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(note_id)
        .bind(req.folder_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(THINKING_NOTE_SOURCE)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        for target in &req.link_to {
            if *target == note_id {
                continue;
            }
            sqlx::query(
                "INSERT INTO link (id, from_note_id, to_note_id, kind, created_at_utc)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (from_note_id, to_note_id, kind) DO NOTHING",
            )
            .bind(new_v7())
            .bind(note_id)
            .bind(target)
            .bind(THINKING_LINK_KIND)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "create_from_draft",
            note_id = %note_id,
            link_count = req.link_to.len(),
            "Created note from thinking draft"
        );
        Ok(note_id)
    }
}
