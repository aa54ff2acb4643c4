//! # ponder-thinking
//!
//! Contextual relevance scoring and thinking sessions for ponder.
//!
//! This crate provides:
//! - Relevance signals over the note graph (links, second hops, tags,
//!   folders, recent views, recency)
//! - A ranker that explains every candidate it returns
//! - The `connect`, `contrast`, `combine` and `bridge` commands, with
//!   deterministic fallbacks whenever the synthesizer cannot help
//! - Time-boxed thinking sessions and a resolver that saves drafts as notes
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ponder_thinking::{ThinkingConfig, ThinkingEngine};
//! use ponder_inference::NullSynthesizer;
//!
//! let db = ponder_db::Database::connect("postgres://localhost/ponder").await?;
//! let engine = ThinkingEngine::new(
//!     Arc::new(db.context.clone()),
//!     Arc::new(db.sessions.clone()),
//!     Arc::new(NullSynthesizer),
//!     ThinkingConfig::default(),
//! );
//! let response = engine.contrast(note_id, &recent_ids).await?;
//! ```

pub mod context;
pub mod engine;
pub mod prompts;
pub mod resolve;
pub mod session;
pub mod signals;

// Re-export core types
pub use ponder_core::*;

pub use context::{build_reason, ContextScorer, ContextualNotes, FALLBACK_REASON, REASON_SEPARATOR};
pub use engine::ThinkingEngine;
pub use resolve::{ResolvePolicy, SessionResolver};
pub use session::{session_ttl, SessionStore};
pub use signals::{SignalMap, SignalSet};
