//! In-memory store for tests and local experiments.
//!
//! Implements every store trait over plain collections. Notes are kept in
//! insertion order, which is also the order `find_notes_by_ids` returns.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use ponder_core::{
    new_v7, ContextStore, CreateNoteRequest, Error, NoteLink, NoteRef, NoteTag, NoteWriter,
    Result, SessionRepository, ThinkingSession,
};

#[derive(Default)]
struct State {
    notes: Vec<NoteRef>,
    deleted: HashSet<Uuid>,
    links: Vec<NoteLink>,
    tags: Vec<NoteTag>,
    sessions: HashMap<Uuid, ThinkingSession>,
    created: Vec<(Uuid, CreateNoteRequest)>,
    fail_writes: bool,
}

impl State {
    fn live(&self, id: Uuid) -> bool {
        !self.deleted.contains(&id) && self.notes.iter().any(|n| n.id == id)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Internal("in-memory store rejects writes".to_string()));
        }
        Ok(())
    }
}

/// Thread-safe in-memory implementation of the store traits.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a note updated now. Returns its id.
    pub fn add_note(&self, title: &str, body: &str, folder_id: Option<Uuid>) -> Uuid {
        self.add_note_at(title, body, folder_id, Utc::now())
    }

    /// Add a note with an explicit update time. Returns its id.
    pub fn add_note_at(
        &self,
        title: &str,
        body: &str,
        folder_id: Option<Uuid>,
        updated_at_utc: DateTime<Utc>,
    ) -> Uuid {
        let id = new_v7();
        self.insert_note(NoteRef {
            id,
            title: title.to_string(),
            body: body.to_string(),
            folder_id,
            updated_at_utc,
        });
        id
    }

    pub fn insert_note(&self, note: NoteRef) {
        self.write().notes.push(note);
    }

    pub fn add_link(&self, from_note_id: Uuid, to_note_id: Uuid) {
        self.write().links.push(NoteLink::new(from_note_id, to_note_id));
    }

    pub fn tag_note(&self, note_id: Uuid, tag: &str) {
        let mut state = self.write();
        let row = NoteTag {
            note_id,
            tag: tag.to_string(),
        };
        if !state.tags.contains(&row) {
            state.tags.push(row);
        }
    }

    /// Hide a note from every query, like a soft delete.
    pub fn soft_delete(&self, note_id: Uuid) {
        self.write().deleted.insert(note_id);
    }

    /// Make every write fail with [`Error::Internal`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.write().fail_writes = fail;
    }

    pub fn session(&self, id: Uuid) -> Option<ThinkingSession> {
        self.read().sessions.get(&id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.read().sessions.len()
    }

    /// Notes created through [`NoteWriter`], oldest first.
    pub fn created_notes(&self) -> Vec<(Uuid, CreateNoteRequest)> {
        self.read().created.clone()
    }

    /// Insert or replace a session directly, bypassing the write switch.
    pub fn put_session(&self, session: ThinkingSession) {
        self.write().sessions.insert(session.id, session);
    }
}

#[async_trait]
impl ContextStore for InMemoryStore {
    async fn find_note_by_id(&self, id: Uuid) -> Result<Option<NoteRef>> {
        let state = self.read();
        Ok(state
            .notes
            .iter()
            .find(|n| n.id == id && !state.deleted.contains(&n.id))
            .cloned())
    }

    async fn find_links_by_endpoint(&self, id: Uuid) -> Result<Vec<NoteLink>> {
        let state = self.read();
        Ok(state
            .links
            .iter()
            .filter(|l| l.from_note_id == id || l.to_note_id == id)
            .filter(|l| state.live(l.from_note_id) && state.live(l.to_note_id))
            .copied()
            .collect())
    }

    async fn find_links_by_endpoints(&self, ids: &[Uuid]) -> Result<Vec<NoteLink>> {
        let state = self.read();
        Ok(state
            .links
            .iter()
            .filter(|l| ids.contains(&l.from_note_id) || ids.contains(&l.to_note_id))
            .filter(|l| state.live(l.from_note_id) && state.live(l.to_note_id))
            .copied()
            .collect())
    }

    async fn find_tags_for_note(&self, id: Uuid) -> Result<Vec<String>> {
        let state = self.read();
        Ok(state
            .tags
            .iter()
            .filter(|t| t.note_id == id)
            .map(|t| t.tag.clone())
            .collect())
    }

    async fn find_notes_by_tag_ids(
        &self,
        tags: &[String],
        exclude_id: Uuid,
    ) -> Result<Vec<NoteTag>> {
        let state = self.read();
        Ok(state
            .tags
            .iter()
            .filter(|t| t.note_id != exclude_id && tags.contains(&t.tag) && state.live(t.note_id))
            .cloned()
            .collect())
    }

    async fn find_notes_by_folder_id(&self, folder_id: Uuid, exclude_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.read();
        Ok(state
            .notes
            .iter()
            .filter(|n| {
                n.id != exclude_id
                    && n.folder_id == Some(folder_id)
                    && !state.deleted.contains(&n.id)
            })
            .map(|n| n.id)
            .collect())
    }

    async fn find_notes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<NoteRef>> {
        let state = self.read();
        Ok(state
            .notes
            .iter()
            .filter(|n| ids.contains(&n.id) && !state.deleted.contains(&n.id))
            .cloned()
            .collect())
    }

    async fn find_updated_at_by_ids(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, DateTime<Utc>)>> {
        let state = self.read();
        Ok(state
            .notes
            .iter()
            .filter(|n| ids.contains(&n.id) && !state.deleted.contains(&n.id))
            .map(|n| (n.id, n.updated_at_utc))
            .collect())
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create(&self, session: &ThinkingSession) -> Result<()> {
        let mut state = self.write();
        state.check_writable()?;
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ThinkingSession>> {
        Ok(self.read().sessions.get(&id).cloned())
    }

    async fn mark_saved(&self, session_id: Uuid, result_note_id: Uuid) -> Result<bool> {
        let mut state = self.write();
        state.check_writable()?;
        match state.sessions.get_mut(&session_id) {
            Some(session) if !session.saved_ids.contains(&result_note_id) => {
                session.saved_ids.push(result_note_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.write();
        state.check_writable()?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl NoteWriter for InMemoryStore {
    async fn create_note(&self, req: CreateNoteRequest) -> Result<Uuid> {
        let mut state = self.write();
        state.check_writable()?;
        let id = new_v7();
        state.notes.push(NoteRef {
            id,
            title: req.title.clone(),
            body: req.content.clone(),
            folder_id: req.folder_id,
            updated_at_utc: Utc::now(),
        });
        for target in &req.link_to {
            state.links.push(NoteLink::new(id, *target));
        }
        state.created.push((id, req));
        Ok(id)
    }
}
