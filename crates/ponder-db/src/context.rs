//! Read-side queries over notes, links, tags and folders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use ponder_core::{ContextStore, Error, NoteLink, NoteRef, NoteTag, Result};

/// PostgreSQL implementation of ContextStore.
#[derive(Clone)]
pub struct PgContextRepository {
    pool: Pool<Postgres>,
}

impl PgContextRepository {
    /// Create a new PgContextRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn note_from_row(row: &PgRow) -> NoteRef {
    NoteRef {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("content"),
        folder_id: row.get("collection_id"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

fn link_from_row(row: &PgRow) -> NoteLink {
    NoteLink {
        from_note_id: row.get("from_note_id"),
        to_note_id: row.get("to_note_id"),
    }
}

#[async_trait]
impl ContextStore for PgContextRepository {
    async fn find_note_by_id(&self, id: Uuid) -> Result<Option<NoteRef>> {
        let row = sqlx::query(
            "SELECT id, title, content, collection_id, updated_at_utc
             FROM note
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn find_links_by_endpoint(&self, id: Uuid) -> Result<Vec<NoteLink>> {
        let rows = sqlx::query(
            "SELECT l.from_note_id, l.to_note_id
             FROM link l
             JOIN note f ON f.id = l.from_note_id AND f.deleted_at IS NULL
             JOIN note t ON t.id = l.to_note_id AND t.deleted_at IS NULL
             WHERE l.from_note_id = $1 OR l.to_note_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(link_from_row).collect())
    }

    async fn find_links_by_endpoints(&self, ids: &[Uuid]) -> Result<Vec<NoteLink>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT l.from_note_id, l.to_note_id
             FROM link l
             JOIN note f ON f.id = l.from_note_id AND f.deleted_at IS NULL
             JOIN note t ON t.id = l.to_note_id AND t.deleted_at IS NULL
             WHERE l.from_note_id = ANY($1) OR l.to_note_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(link_from_row).collect())
    }

    async fn find_tags_for_note(&self, id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT tag_name FROM note_tag WHERE note_id = $1 ORDER BY tag_name")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(|row| row.get("tag_name")).collect())
    }

    async fn find_notes_by_tag_ids(
        &self,
        tags: &[String],
        exclude_id: Uuid,
    ) -> Result<Vec<NoteTag>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT nt.note_id, nt.tag_name
             FROM note_tag nt
             JOIN note n ON n.id = nt.note_id AND n.deleted_at IS NULL
             WHERE nt.tag_name = ANY($1) AND nt.note_id <> $2",
        )
        .bind(tags)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| NoteTag {
                note_id: row.get("note_id"),
                tag: row.get("tag_name"),
            })
            .collect())
    }

    async fn find_notes_by_folder_id(&self, folder_id: Uuid, exclude_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT id FROM note
             WHERE collection_id = $1 AND id <> $2 AND deleted_at IS NULL",
        )
        .bind(folder_id)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn find_notes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<NoteRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // No ORDER BY: callers must not rely on the order of this result.
        let rows = sqlx::query(
            "SELECT id, title, content, collection_id, updated_at_utc
             FROM note
             WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn find_updated_at_by_ids(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, DateTime<Utc>)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, updated_at_utc FROM note WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| (row.get("id"), row.get("updated_at_utc")))
            .collect())
    }
}
