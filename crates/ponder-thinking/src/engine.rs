//! Thinking command dispatcher.
//!
//! Every command shares the same first step: rank up to `candidate_limit`
//! notes around the origin. `connect` then explains each candidate; the
//! selective commands (`contrast`, `combine`, `bridge`) pick exactly one and
//! draft a note for it. Synthesizer failures of any kind fall back to the
//! deterministic heuristic output. Each invocation stores exactly one session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use ponder_core::logging::{
    COMPONENT_DISPATCH, FALLBACK_FIRST_CANDIDATE, FALLBACK_HEURISTIC_REASON, FALLBACK_TEMPLATE,
    SUBSYSTEM_THINKING,
};
use ponder_core::{
    ContextStore, NoteRef, Result, SessionRepository, SynthesisError, SynthesisRequest,
    Synthesizer, ThinkingCommand, ThinkingConfig, ThinkingResponse, ThinkingResult,
};

use crate::context::{ContextScorer, ContextualNotes};
use crate::prompts;
use crate::session::SessionStore;

type SynthesisResult = std::result::Result<JsonValue, SynthesisError>;

/// What a selective synthesizer answer must carry to be usable.
#[derive(Debug, Clone, PartialEq)]
struct Selection {
    selected_note_id: Option<Uuid>,
    reason: String,
    content: String,
    title: Option<String>,
}

fn non_empty_str(value: &JsonValue, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_id(value: &JsonValue, key: &str) -> Option<Uuid> {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Parse a selective answer. `None` when the reason or the draft is missing.
fn parse_selection(value: &JsonValue) -> Option<Selection> {
    Some(Selection {
        selected_note_id: parse_id(value, "selected_note_id"),
        reason: non_empty_str(value, "reason")?,
        content: non_empty_str(value, "content")?,
        title: non_empty_str(value, "title"),
    })
}

/// Parse a connect answer into per-note reasons. `None` without a `reasons` array.
fn parse_connect_reasons(value: &JsonValue) -> Option<HashMap<Uuid, String>> {
    let entries = value.get("reasons")?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| Some((parse_id(entry, "note_id")?, non_empty_str(entry, "reason")?)))
            .collect(),
    )
}

/// Runs thinking commands against a note store, a session repository and a
/// synthesizer.
#[derive(Clone)]
pub struct ThinkingEngine {
    scorer: ContextScorer,
    sessions: SessionStore,
    synthesizer: Arc<dyn Synthesizer>,
    config: ThinkingConfig,
}

impl ThinkingEngine {
    pub fn new(
        store: Arc<dyn ContextStore>,
        sessions: Arc<dyn SessionRepository>,
        synthesizer: Arc<dyn Synthesizer>,
        config: ThinkingConfig,
    ) -> Self {
        Self {
            scorer: ContextScorer::new(store, config.weights),
            sessions: SessionStore::new(sessions),
            synthesizer,
            config,
        }
    }

    pub fn scorer(&self) -> &ContextScorer {
        &self.scorer
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn config(&self) -> &ThinkingConfig {
        &self.config
    }

    pub async fn connect(&self, note_id: Uuid, recent: &[Uuid]) -> Result<ThinkingResponse> {
        self.run(ThinkingCommand::Connect, note_id, recent).await
    }

    pub async fn contrast(&self, note_id: Uuid, recent: &[Uuid]) -> Result<ThinkingResponse> {
        self.run(ThinkingCommand::Contrast, note_id, recent).await
    }

    pub async fn combine(&self, note_id: Uuid, recent: &[Uuid]) -> Result<ThinkingResponse> {
        self.run(ThinkingCommand::Combine, note_id, recent).await
    }

    pub async fn bridge(&self, note_id: Uuid, recent: &[Uuid]) -> Result<ThinkingResponse> {
        self.run(ThinkingCommand::Bridge, note_id, recent).await
    }

    /// Run any command as of now.
    pub async fn run(
        &self,
        command: ThinkingCommand,
        note_id: Uuid,
        recent: &[Uuid],
    ) -> Result<ThinkingResponse> {
        self.run_at(command, note_id, recent, Utc::now()).await
    }

    /// Run a command with an explicit clock for recency and session expiry.
    ///
    /// Only a missing origin note or a storage failure returns an error.
    #[instrument(
        skip_all,
        fields(subsystem = SUBSYSTEM_THINKING, component = COMPONENT_DISPATCH, op = "run", command = %command, note_id = %note_id)
    )]
    pub async fn run_at(
        &self,
        command: ThinkingCommand,
        note_id: Uuid,
        recent: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<ThinkingResponse> {
        let start = Instant::now();
        let ctx = self
            .scorer
            .rank_at(note_id, recent, self.config.candidate_limit, now)
            .await?;

        let (stored, returned) = if ctx.is_empty() {
            debug!(
                subsystem = SUBSYSTEM_THINKING,
                component = COMPONENT_DISPATCH,
                command = %command,
                note_id = %note_id,
                "No candidates, storing empty session"
            );
            (Vec::new(), Vec::new())
        } else if command.selects_one() {
            let selected: Vec<ThinkingResult> =
                self.select_one(command, &ctx).await.into_iter().collect();
            (selected.clone(), selected)
        } else {
            let all = self.connect_results(&ctx).await;
            let head: Vec<ThinkingResult> = all
                .iter()
                .take(self.config.connect_return_limit)
                .cloned()
                .collect();
            (all, head)
        };

        let session = self
            .sessions
            .create_at(ctx.origin.id, command, ctx.candidate_ids(), stored, now)
            .await?;

        info!(
            subsystem = SUBSYSTEM_THINKING,
            component = COMPONENT_DISPATCH,
            op = "run",
            command = %command,
            note_id = %note_id,
            session_id = %session.id,
            candidate_count = ctx.candidates.len(),
            result_count = returned.len(),
            synthesizer = self.synthesizer.name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Thinking command completed"
        );

        Ok(ThinkingResponse {
            session_id: session.id,
            command,
            results: returned,
            expires_at: session.expires_at_utc,
        })
    }

    /// One synthesizer call bounded by the configured deadline.
    async fn synthesize(&self, command: ThinkingCommand, ctx: &ContextualNotes) -> SynthesisResult {
        let request = SynthesisRequest {
            system: prompts::system_prompt(command).to_string(),
            prompt: prompts::user_prompt(
                &ctx.origin,
                &ctx.candidates,
                &ctx.notes,
                self.config.excerpt_length,
            ),
            response_format: prompts::response_format(command),
        };
        let deadline = self.config.synthesis_timeout;
        tokio::time::timeout(deadline, self.synthesizer.synthesize(&request))
            .await
            .unwrap_or(Err(SynthesisError::Timeout(deadline)))
    }

    fn log_fallback(&self, command: ThinkingCommand, error: &SynthesisError, fallback: &str) {
        if error.is_unavailable() {
            debug!(
                subsystem = SUBSYSTEM_THINKING,
                component = COMPONENT_DISPATCH,
                command = %command,
                fallback,
                "Synthesizer unavailable, using deterministic output"
            );
        } else {
            warn!(
                subsystem = SUBSYSTEM_THINKING,
                component = COMPONENT_DISPATCH,
                command = %command,
                synthesizer = self.synthesizer.name(),
                fallback,
                error = %error,
                "Synthesis failed, using deterministic output"
            );
        }
    }

    fn preview(&self, note: Option<&NoteRef>) -> Option<String> {
        note.map(|n| n.excerpt(self.config.preview_length))
    }

    /// One result per candidate in rank order, reasons enhanced when possible.
    async fn connect_results(&self, ctx: &ContextualNotes) -> Vec<ThinkingResult> {
        let command = ThinkingCommand::Connect;
        let enhanced = match self.synthesize(command, ctx).await {
            Ok(value) => parse_connect_reasons(&value).unwrap_or_else(|| {
                let error = SynthesisError::Malformed("missing reasons array".to_string());
                self.log_fallback(command, &error, FALLBACK_HEURISTIC_REASON);
                HashMap::new()
            }),
            Err(error) => {
                self.log_fallback(command, &error, FALLBACK_HEURISTIC_REASON);
                HashMap::new()
            }
        };

        ctx.candidates
            .iter()
            .map(|candidate| ThinkingResult {
                note_id: candidate.note_id,
                note_title: candidate.title.clone(),
                reason: enhanced
                    .get(&candidate.note_id)
                    .cloned()
                    .unwrap_or_else(|| candidate.reason.clone()),
                preview: self.preview(ctx.note(candidate.note_id)),
                content: None,
                result_title: None,
            })
            .collect()
    }

    /// The single result of a selective command.
    ///
    /// The deterministic fallback takes the first note in store order, which
    /// is not necessarily the best ranked candidate.
    async fn select_one(
        &self,
        command: ThinkingCommand,
        ctx: &ContextualNotes,
    ) -> Option<ThinkingResult> {
        let first = ctx.notes.first()?;

        let selection = match self.synthesize(command, ctx).await {
            Ok(value) => match parse_selection(&value) {
                Some(selection) => selection,
                None => {
                    let error =
                        SynthesisError::Malformed("missing reason or content".to_string());
                    self.log_fallback(command, &error, FALLBACK_TEMPLATE);
                    return Some(self.template_result(command, ctx, first));
                }
            },
            Err(error) => {
                self.log_fallback(command, &error, FALLBACK_TEMPLATE);
                return Some(self.template_result(command, ctx, first));
            }
        };

        let chosen = match selection
            .selected_note_id
            .filter(|id| *id != ctx.origin.id && ctx.candidate(*id).is_some())
            .and_then(|id| ctx.note(id))
        {
            Some(note) => note,
            None => {
                warn!(
                    subsystem = SUBSYSTEM_THINKING,
                    component = COMPONENT_DISPATCH,
                    command = %command,
                    selected = ?selection.selected_note_id,
                    fallback = FALLBACK_FIRST_CANDIDATE,
                    "Synthesizer selected a note outside the candidate set"
                );
                first
            }
        };

        Some(ThinkingResult {
            note_id: chosen.id,
            note_title: chosen.title.clone(),
            reason: selection.reason,
            preview: self.preview(Some(chosen)),
            content: Some(selection.content),
            result_title: Some(selection.title.unwrap_or_else(|| {
                prompts::fallback_title(command, &ctx.origin.title, &chosen.title)
            })),
        })
    }

    fn template_result(
        &self,
        command: ThinkingCommand,
        ctx: &ContextualNotes,
        note: &NoteRef,
    ) -> ThinkingResult {
        let reason = ctx
            .candidate(note.id)
            .map(|c| c.reason.clone())
            .unwrap_or_else(|| crate::context::FALLBACK_REASON.to_string());
        ThinkingResult {
            note_id: note.id,
            note_title: note.title.clone(),
            content: Some(prompts::fallback_content(
                command,
                &ctx.origin.title,
                &note.title,
                &reason,
            )),
            result_title: Some(prompts::fallback_title(
                command,
                &ctx.origin.title,
                &note.title,
            )),
            preview: self.preview(Some(note)),
            reason,
        }
    }
}
