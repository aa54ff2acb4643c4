//! Error types for ponder.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using ponder's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ponder operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    /// Thinking session not found
    #[error("Thinking session not found: {0}")]
    SessionNotFound(Uuid),

    /// The requested result is not part of the session's output
    #[error("Note {note_id} is not a result of thinking session {session_id}")]
    ResultNotInSession { session_id: Uuid, note_id: Uuid },

    /// Thinking session is past its expiry
    #[error("Thinking session expired: {0}")]
    SessionExpired(Uuid),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

/// Recoverable failures of a synthesizer call.
///
/// None of these fail a thinking command: the dispatcher catches them per call
/// and substitutes the deterministic fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// No synthesizer is configured.
    #[error("Synthesizer unavailable")]
    Unavailable,

    /// Network, HTTP or non-2xx failure talking to the model.
    #[error("Synthesizer request failed: {0}")]
    Request(String),

    /// The call did not finish before the engine deadline.
    #[error("Synthesizer timed out after {0:?}")]
    Timeout(Duration),

    /// Response was not valid JSON or lacked expected fields.
    #[error("Malformed synthesizer response: {0}")]
    Malformed(String),
}

impl SynthesisError {
    /// True for the expected "nothing configured" case, which is not worth a warning.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SynthesisError::Unavailable)
    }
}

impl From<Error> for SynthesisError {
    fn from(e: Error) -> Self {
        SynthesisError::Request(e.to_string())
    }
}
