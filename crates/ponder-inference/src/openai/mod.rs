//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint that speaks `/chat/completions`: OpenAI itself,
//! OpenRouter, vLLM, LM Studio, or Ollama in compatibility mode.
//!
//! # Example
//!
//! ```rust,no_run
//! use ponder_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! let backend = OpenAIBackend::new(OpenAIConfig {
//!     base_url: "http://localhost:11434/v1".to_string(),
//!     api_key: None,
//!     ..Default::default()
//! })
//! .unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_GEN_MODEL, DEFAULT_OPENAI_URL};
pub use error::{to_ponder_error, OpenAIErrorCode};
pub use types::*;
