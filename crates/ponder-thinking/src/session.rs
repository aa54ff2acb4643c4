//! Thinking session lifecycle: creation with a fixed TTL, lookup and purge.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use ponder_core::defaults::SESSION_TTL_HOURS;
use ponder_core::logging::{COMPONENT_SESSION, SUBSYSTEM_THINKING};
use ponder_core::{
    new_v7, Result, SessionRepository, ThinkingCommand, ThinkingResult, ThinkingSession,
};

/// Lifetime of every session.
pub fn session_ttl() -> Duration {
    Duration::hours(SESSION_TTL_HOURS)
}

/// Creates and looks up thinking sessions.
#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
}

impl SessionStore {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self { repo }
    }

    /// Persist one session created now.
    pub async fn create(
        &self,
        note_id: Uuid,
        command: ThinkingCommand,
        input: Vec<Uuid>,
        output: Vec<ThinkingResult>,
    ) -> Result<ThinkingSession> {
        self.create_at(note_id, command, input, output, Utc::now())
            .await
    }

    /// Persist one session created at `now`. Expires exactly one TTL later.
    pub async fn create_at(
        &self,
        note_id: Uuid,
        command: ThinkingCommand,
        input: Vec<Uuid>,
        output: Vec<ThinkingResult>,
        now: DateTime<Utc>,
    ) -> Result<ThinkingSession> {
        let session = ThinkingSession {
            id: new_v7(),
            note_id,
            command,
            input,
            output,
            saved_ids: Vec::new(),
            created_at_utc: now,
            expires_at_utc: now + session_ttl(),
        };
        self.repo.create(&session).await?;

        debug!(
            subsystem = SUBSYSTEM_THINKING,
            component = COMPONENT_SESSION,
            op = "create",
            session_id = %session.id,
            note_id = %note_id,
            command = %command,
            result_count = session.output.len(),
            "Thinking session stored"
        );
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ThinkingSession>> {
        self.repo.get(id).await
    }

    /// Record a result as saved. `false` when it already was.
    pub async fn mark_saved(&self, session_id: Uuid, result_note_id: Uuid) -> Result<bool> {
        self.repo.mark_saved(session_id, result_note_id).await
    }

    /// Delete every session past its expiry.
    pub async fn purge_expired(&self) -> Result<u64> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64> {
        let deleted = self.repo.delete_expired(now).await?;
        info!(
            subsystem = SUBSYSTEM_THINKING,
            component = COMPONENT_SESSION,
            op = "purge_expired",
            deleted,
            "Expired thinking sessions purged"
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponder_db::InMemoryStore;

    #[tokio::test]
    async fn test_create_sets_exact_ttl_and_empty_saved_ids() {
        let repo = Arc::new(InMemoryStore::new());
        let store = SessionStore::new(repo.clone());
        let now = Utc::now();

        let session = store
            .create_at(Uuid::new_v4(), ThinkingCommand::Connect, vec![], vec![], now)
            .await
            .unwrap();

        assert_eq!(session.expires_at_utc - session.created_at_utc, Duration::hours(24));
        assert!(session.saved_ids.is_empty());
        assert_eq!(repo.session(session.id), Some(session));
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_sessions() {
        let repo = Arc::new(InMemoryStore::new());
        let store = SessionStore::new(repo.clone());
        let now = Utc::now();

        store
            .create_at(Uuid::new_v4(), ThinkingCommand::Bridge, vec![], vec![], now - Duration::hours(30))
            .await
            .unwrap();
        let live = store
            .create_at(Uuid::new_v4(), ThinkingCommand::Bridge, vec![], vec![], now)
            .await
            .unwrap();

        assert_eq!(store.purge_expired_at(now).await.unwrap(), 1);
        assert_eq!(repo.session_count(), 1);
        assert!(store.get(live.id).await.unwrap().is_some());
    }
}
