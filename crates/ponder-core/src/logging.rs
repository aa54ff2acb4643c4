//! Structured logging schema for ponder.
//!
//! Every crate logs through `tracing` with the same field names so log
//! aggregation can query across the store, the inference backends and the
//! engine.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, deterministic fallback applied |
//! | INFO  | Lifecycle events, command completions |
//! | DEBUG | Decision points, signal sizes, config choices |
//! | TRACE | Per-candidate scores |
//!
//! ## Fields
//!
//! `subsystem`, `component`, `op` identify the emitter. Entity fields are
//! `note_id`, `session_id`, `command`; measurements are `candidate_count`,
//! `result_count`, `duration_ms`, `prompt_len`, `response_len`. A `fallback`
//! field names the deterministic path taken after a synthesizer failure.

// ─── Subsystems ────────────────────────────────────────────────────────────

/// Database layer.
pub const SUBSYSTEM_DB: &str = "database";

/// Model backends and synthesizers.
pub const SUBSYSTEM_INFERENCE: &str = "inference";

/// Relevance scoring, command dispatch and sessions.
pub const SUBSYSTEM_THINKING: &str = "thinking";

// ─── Components ────────────────────────────────────────────────────────────

/// Candidate retrieval and ranking.
pub const COMPONENT_CONTEXT: &str = "context";

/// Thinking command dispatcher.
pub const COMPONENT_DISPATCH: &str = "dispatch";

/// Session persistence and resolution.
pub const COMPONENT_SESSION: &str = "session";

// ─── Fallback labels ───────────────────────────────────────────────────────

/// Heuristic reasons kept because the synthesizer could not enhance them.
pub const FALLBACK_HEURISTIC_REASON: &str = "heuristic_reason";

/// Canned template used instead of a synthesized draft.
pub const FALLBACK_TEMPLATE: &str = "template";

/// Synthesizer picked an id outside the candidate set.
pub const FALLBACK_FIRST_CANDIDATE: &str = "first_candidate";
