//! Promotes a session result into a permanent note.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use ponder_core::logging::{COMPONENT_SESSION, SUBSYSTEM_THINKING};
use ponder_core::{
    ContextStore, CreateNoteRequest, Error, NoteWriter, ResolveRequest, ResolveResponse, Result,
    SessionRepository, ThinkingResult,
};

/// Rules applied when resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvePolicy {
    /// Refuse sessions past their expiry. Off by default.
    pub reject_expired: bool,
}

/// Handles save requests for thinking results.
///
/// Idempotent per `(session_id, result_note_id)`: a result that was already
/// saved is reported as such and nothing is created.
#[derive(Clone)]
pub struct SessionResolver {
    sessions: Arc<dyn SessionRepository>,
    notes: Arc<dyn ContextStore>,
    writer: Arc<dyn NoteWriter>,
    policy: ResolvePolicy,
}

impl SessionResolver {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        notes: Arc<dyn ContextStore>,
        writer: Arc<dyn NoteWriter>,
    ) -> Self {
        Self {
            sessions,
            notes,
            writer,
            policy: ResolvePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn resolve(&self, req: ResolveRequest) -> Result<ResolveResponse> {
        self.resolve_at(req, Utc::now()).await
    }

    pub async fn resolve_at(&self, req: ResolveRequest, now: DateTime<Utc>) -> Result<ResolveResponse> {
        let session = self
            .sessions
            .get(req.session_id)
            .await?
            .ok_or(Error::SessionNotFound(req.session_id))?;

        if self.policy.reject_expired && session.is_expired(now) {
            return Err(Error::SessionExpired(session.id));
        }

        let result = session
            .result(req.result_note_id)
            .ok_or(Error::ResultNotInSession {
                session_id: session.id,
                note_id: req.result_note_id,
            })?;

        if session.is_saved(req.result_note_id) {
            info!(
                subsystem = SUBSYSTEM_THINKING,
                component = COMPONENT_SESSION,
                op = "resolve",
                session_id = %session.id,
                note_id = %req.result_note_id,
                "Result already saved"
            );
            return Ok(ResolveResponse {
                session_id: session.id,
                result_note_id: req.result_note_id,
                note_id: None,
                already_saved: true,
            });
        }

        let folder_id = self
            .notes
            .find_note_by_id(session.note_id)
            .await?
            .and_then(|origin| origin.folder_id);

        let note_id = self
            .writer
            .create_note(CreateNoteRequest {
                title: note_title(&req, result),
                content: note_content(&req, result),
                folder_id,
                link_to: vec![session.note_id, result.note_id],
            })
            .await?;

        if !self.sessions.mark_saved(session.id, result.note_id).await? {
            warn!(
                subsystem = SUBSYSTEM_THINKING,
                component = COMPONENT_SESSION,
                session_id = %session.id,
                note_id = %result.note_id,
                "Result was saved concurrently"
            );
        }

        info!(
            subsystem = SUBSYSTEM_THINKING,
            component = COMPONENT_SESSION,
            op = "resolve",
            session_id = %session.id,
            note_id = %note_id,
            command = %session.command,
            "Thinking result saved as note"
        );

        Ok(ResolveResponse {
            session_id: session.id,
            result_note_id: req.result_note_id,
            note_id: Some(note_id),
            already_saved: false,
        })
    }
}

fn note_content(req: &ResolveRequest, result: &ThinkingResult) -> String {
    if let Some(user) = req.user_content.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return user.to_string();
    }
    if let Some(draft) = result.content.as_deref().filter(|s| !s.trim().is_empty()) {
        return draft.to_string();
    }
    match result.preview.as_deref() {
        Some(preview) if !preview.is_empty() => format!("{}\n\n{}", result.reason, preview),
        _ => result.reason.clone(),
    }
}

fn note_title(req: &ResolveRequest, result: &ThinkingResult) -> String {
    req.result_title
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| result.result_title.clone())
        .unwrap_or_else(|| result.note_title.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponder_core::SaveAs;
    use uuid::Uuid;

    fn result(content: Option<&str>, preview: Option<&str>) -> ThinkingResult {
        ThinkingResult {
            note_id: Uuid::new_v4(),
            note_title: "Caffeine".to_string(),
            reason: "Direct link".to_string(),
            preview: preview.map(str::to_string),
            content: content.map(str::to_string),
            result_title: None,
        }
    }

    fn request(user_content: Option<&str>, title: Option<&str>) -> ResolveRequest {
        ResolveRequest {
            session_id: Uuid::new_v4(),
            result_note_id: Uuid::new_v4(),
            save_as: SaveAs::NewNote,
            user_content: user_content.map(str::to_string),
            result_title: title.map(str::to_string),
        }
    }

    #[test]
    fn test_content_precedence() {
        let drafted = result(Some("## Draft"), Some("preview"));
        assert_eq!(note_content(&request(Some(" mine "), None), &drafted), "mine");
        assert_eq!(note_content(&request(Some("   "), None), &drafted), "## Draft");

        let plain = result(None, Some("Adenosine builds up."));
        assert_eq!(
            note_content(&request(None, None), &plain),
            "Direct link\n\nAdenosine builds up."
        );
        assert_eq!(note_content(&request(None, None), &result(None, None)), "Direct link");
    }

    #[test]
    fn test_title_precedence() {
        let mut r = result(None, None);
        assert_eq!(note_title(&request(None, None), &r), "Caffeine");
        r.result_title = Some("Sleep vs. Caffeine".to_string());
        assert_eq!(note_title(&request(None, None), &r), "Sleep vs. Caffeine");
        assert_eq!(note_title(&request(None, Some("Mine")), &r), "Mine");
    }
}
