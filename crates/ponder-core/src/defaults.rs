//! Centralized default constants for ponder.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic numbers.
//!
//! Organized by domain area.

// =============================================================================
// RELEVANCE SIGNAL WEIGHTS
// =============================================================================

/// Score for a note directly linked to the origin (either direction).
pub const DIRECT_LINK: f64 = 50.0;

/// Score for a note reachable only through a directly linked note.
pub const SECOND_HOP: f64 = 25.0;

/// Score per tag shared with the origin (additive across tags).
pub const SAME_TAG: f64 = 20.0;

/// Flat score for a note in the origin's folder.
pub const SAME_FOLDER: f64 = 15.0;

/// Base score for the most recently viewed note.
pub const RECENT_VIEW: f64 = 30.0;

/// Maximum recency boost for a note updated just now.
pub const RECENCY: f64 = 10.0;

/// Recency boost decays linearly to zero over this many days.
pub const RECENCY_WINDOW_DAYS: f64 = 7.0;

/// Fraction of `RECENT_VIEW` lost per position in the recent-view list.
pub const RECENT_VIEW_STEP: f64 = 0.1;

/// Recent-view score never drops below `RECENT_VIEW * RECENT_VIEW_FLOOR`.
pub const RECENT_VIEW_FLOOR: f64 = 0.5;

// =============================================================================
// THINKING COMMANDS
// =============================================================================

/// Number of ranked candidates every command considers.
pub const CANDIDATE_LIMIT: usize = 5;

/// Number of connect results returned to the immediate caller.
pub const CONNECT_RETURN_LIMIT: usize = 2;

/// Preview length in characters for thinking results.
pub const PREVIEW_LENGTH: usize = 200;

/// Characters of each note body included in synthesizer prompts.
pub const PROMPT_EXCERPT_LENGTH: usize = 600;

/// Thinking sessions expire this many hours after creation. Never renewed.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Engine-level deadline for a single synthesizer call, in seconds.
pub const SYNTHESIS_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model name (Ollama).
pub const GEN_MODEL: &str = "gpt-oss:20b";

/// Default OpenAI-compatible endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI-compatible generation model.
pub const OPENAI_GEN_MODEL: &str = "gpt-4o-mini";

/// HTTP timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// DATABASE
// =============================================================================

/// Default database URL when `DATABASE_URL` is unset.
pub const DATABASE_URL: &str = "postgres://localhost/ponder";

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_precedence() {
        assert!(DIRECT_LINK > SECOND_HOP);
        assert!(SECOND_HOP > SAME_TAG);
        assert!(SAME_TAG > SAME_FOLDER);
    }

    #[test]
    fn test_recent_view_floor_matches_same_folder() {
        assert_eq!(RECENT_VIEW * RECENT_VIEW_FLOOR, 15.0);
    }

    #[test]
    fn test_connect_returns_subset_of_candidates() {
        assert!(CONNECT_RETURN_LIMIT <= CANDIDATE_LIMIT);
    }
}
