//! Core traits for ponder abstractions.
//!
//! These traits define the collaborators the engine is written against,
//! enabling pluggable storage and model backends and deterministic tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Result, SynthesisError};
use crate::models::*;

// =============================================================================
// STORE TRAITS
// =============================================================================

/// Read-only access to notes, links, tags and folders.
///
/// Soft-deleted notes are invisible to every method.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Fetch one note.
    async fn find_note_by_id(&self, id: Uuid) -> Result<Option<NoteRef>>;

    /// Links where `id` is either endpoint.
    async fn find_links_by_endpoint(&self, id: Uuid) -> Result<Vec<NoteLink>>;

    /// Links where any of `ids` is either endpoint.
    async fn find_links_by_endpoints(&self, ids: &[Uuid]) -> Result<Vec<NoteLink>>;

    /// Tag names attached to a note.
    async fn find_tags_for_note(&self, id: Uuid) -> Result<Vec<String>>;

    /// Memberships of other notes in any of `tags`, one row per (note, tag).
    async fn find_notes_by_tag_ids(&self, tags: &[String], exclude_id: Uuid)
        -> Result<Vec<NoteTag>>;

    /// Ids of the other notes in a folder.
    async fn find_notes_by_folder_id(&self, folder_id: Uuid, exclude_id: Uuid)
        -> Result<Vec<Uuid>>;

    /// Fetch several notes. Result order is not guaranteed.
    async fn find_notes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<NoteRef>>;

    /// Last update time of each found note.
    async fn find_updated_at_by_ids(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, DateTime<Utc>)>>;
}

/// Persistence for thinking sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session.
    async fn create(&self, session: &ThinkingSession) -> Result<()>;

    /// Fetch a session by id.
    async fn get(&self, id: Uuid) -> Result<Option<ThinkingSession>>;

    /// Append `result_note_id` to `saved_ids` unless already present.
    ///
    /// Returns `true` when the id was appended.
    async fn mark_saved(&self, session_id: Uuid, result_note_id: Uuid) -> Result<bool>;

    /// Delete sessions that expired at or before `now`. Returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Creates permanent notes from resolved drafts.
#[async_trait]
pub trait NoteWriter: Send + Sync {
    /// Create a note and its outgoing links. Returns the new note id.
    async fn create_note(&self, req: CreateNoteRequest) -> Result<Uuid>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate with backend-enforced JSON output.
    async fn generate_json_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// A structured prompt plus the JSON shape the answer must take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub system: String,
    pub prompt: String,
    /// Description of the expected JSON object, e.g. `{"reason": "string"}`.
    pub response_format: JsonValue,
}

/// LLM-backed capability that elaborates or selects among candidates.
///
/// Chosen once at construction. The unavailable variant always returns
/// [`SynthesisError::Unavailable`] so callers fall back deterministically.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Run one structured request and return the parsed JSON answer.
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> std::result::Result<JsonValue, SynthesisError>;

    /// Whether a real model sits behind this synthesizer.
    fn is_available(&self) -> bool;

    /// Name for logs (model or "none").
    fn name(&self) -> &str;
}
