//! Core data models for ponder.
//!
//! Notes, links and tags are owned by the persistence layer and are read-only
//! here. Candidates and results are derived per invocation; only the
//! [`ThinkingSession`] is persisted by the engine itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// NOTE GRAPH TYPES
// =============================================================================

/// A note as seen by the relevance scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRef {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub folder_id: Option<Uuid>,
    pub updated_at_utc: DateTime<Utc>,
}

impl NoteRef {
    /// Leading excerpt of the body, at most `max_chars` characters.
    pub fn excerpt(&self, max_chars: usize) -> String {
        excerpt(&self.body, max_chars)
    }
}

/// Directed edge between two notes. Treated as symmetric for relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteLink {
    pub from_note_id: Uuid,
    pub to_note_id: Uuid,
}

impl NoteLink {
    pub fn new(from_note_id: Uuid, to_note_id: Uuid) -> Self {
        Self {
            from_note_id,
            to_note_id,
        }
    }

    /// The endpoint opposite `id`, or `None` when `id` is not an endpoint.
    pub fn other_end(&self, id: Uuid) -> Option<Uuid> {
        if self.from_note_id == id {
            Some(self.to_note_id)
        } else if self.to_note_id == id {
            Some(self.from_note_id)
        } else {
            None
        }
    }
}

/// One note/tag membership row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteTag {
    pub note_id: Uuid,
    pub tag: String,
}

// =============================================================================
// CANDIDATE TYPES
// =============================================================================

/// A note discovered by at least one relevance signal.
///
/// Never the origin note; a candidate list never repeats an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub note_id: Uuid,
    pub title: String,
    pub score: f64,
    pub reason: String,
}

// =============================================================================
// THINKING TYPES
// =============================================================================

/// The four thinking operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingCommand {
    /// Surface the most related notes with a justification each.
    Connect,
    /// Pick one note whose ideas diverge from the origin.
    Contrast,
    /// Pick one note to merge with the origin into a new concept.
    Combine,
    /// Pick one distant note and suggest concepts bridging the gap.
    Bridge,
}

impl ThinkingCommand {
    pub const ALL: [ThinkingCommand; 4] = [
        ThinkingCommand::Connect,
        ThinkingCommand::Contrast,
        ThinkingCommand::Combine,
        ThinkingCommand::Bridge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThinkingCommand::Connect => "connect",
            ThinkingCommand::Contrast => "contrast",
            ThinkingCommand::Combine => "combine",
            ThinkingCommand::Bridge => "bridge",
        }
    }

    /// Commands that select exactly one candidate and draft content for it.
    pub fn selects_one(&self) -> bool {
        !matches!(self, ThinkingCommand::Connect)
    }
}

impl std::fmt::Display for ThinkingCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThinkingCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "connect" => Ok(ThinkingCommand::Connect),
            "contrast" => Ok(ThinkingCommand::Contrast),
            "combine" => Ok(ThinkingCommand::Combine),
            "bridge" => Ok(ThinkingCommand::Bridge),
            _ => Err(format!(
                "Invalid thinking command: {}. Valid values: connect, contrast, combine, bridge",
                s
            )),
        }
    }
}

/// One draft produced by a thinking command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingResult {
    pub note_id: Uuid,
    pub note_title: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Markdown draft (contrast/combine/bridge).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Suggested title for the note the draft would become.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_title: Option<String>,
}

/// Persisted record of one command invocation.
///
/// `expires_at_utc` is fixed at creation to exactly `created_at_utc + 24h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingSession {
    pub id: Uuid,
    /// Origin note.
    pub note_id: Uuid,
    pub command: ThinkingCommand,
    /// Candidate note ids considered, in rank order.
    pub input: Vec<Uuid>,
    pub output: Vec<ThinkingResult>,
    /// Result note ids the user has promoted to permanent notes.
    pub saved_ids: Vec<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub expires_at_utc: DateTime<Utc>,
}

impl ThinkingSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at_utc
    }

    /// Look up an output entry by its note id.
    pub fn result(&self, note_id: Uuid) -> Option<&ThinkingResult> {
        self.output.iter().find(|r| r.note_id == note_id)
    }

    pub fn is_saved(&self, note_id: Uuid) -> bool {
        self.saved_ids.contains(&note_id)
    }
}

/// What a thinking command returns to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingResponse {
    pub session_id: Uuid,
    pub command: ThinkingCommand,
    pub results: Vec<ThinkingResult>,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// RESOLVE TYPES
// =============================================================================

/// How a resolved draft is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveAs {
    #[default]
    NewNote,
}

/// Request to promote one session result into a permanent note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub session_id: Uuid,
    pub result_note_id: Uuid,
    #[serde(default)]
    pub save_as: SaveAs,
    /// User-edited content; replaces the draft when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_title: Option<String>,
}

/// Outcome of a resolve call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub session_id: Uuid,
    pub result_note_id: Uuid,
    /// Id of the newly created note; `None` when the result was already saved.
    pub note_id: Option<Uuid>,
    pub already_saved: bool,
}

/// Request for creating a permanent note from a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub folder_id: Option<Uuid>,
    /// Notes the new note links to.
    pub link_to: Vec<Uuid>,
}

// =============================================================================
// HELPERS
// =============================================================================

/// Leading excerpt of `text`, at most `max_chars` characters, with an ellipsis
/// when truncated.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
