//! # ponder-core
//!
//! Core types, traits, and abstractions for the ponder thinking engine.
//!
//! This crate provides the domain model shared by the storage, inference and
//! engine crates: notes as seen by the relevance scorer, candidates, thinking
//! results and sessions, plus the collaborator traits the engine is written
//! against.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use config::{ScoringWeights, ThinkingConfig};
pub use error::{Error, Result, SynthesisError};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
