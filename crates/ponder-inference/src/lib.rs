//! # ponder-inference
//!
//! LLM generation backends and synthesizers for the ponder thinking engine.
//!
//! This crate provides:
//! - Ollama generation backend (default)
//! - OpenAI-compatible generation backend (optional, feature `openai`)
//! - [`LlmSynthesizer`] with lenient JSON extraction
//! - [`NullSynthesizer`] for running without a model
//! - Provider selection from the environment
//! - A scripted synthesizer for tests (feature `mock`)
//!
//! # Feature Flags
//!
//! - `ollama` (default): Enable Ollama backend
//! - `openai`: Enable OpenAI-compatible backend
//! - `mock`: Enable [`mock::ScriptedSynthesizer`]
//!
//! # Example
//!
//! ```rust,no_run
//! use ponder_inference::{build_synthesizer, SynthesizerConfig};
//!
//! let synth = build_synthesizer(&SynthesizerConfig::from_env());
//! println!("synthesizer: {}", synth.name());
//! ```

pub mod provider;
pub mod synthesizer;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use ponder_core::*;

#[cfg(feature = "ollama")]
pub use ollama::OllamaBackend;

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};

pub use provider::{build_synthesizer, SynthesisProvider, SynthesizerConfig};
pub use synthesizer::{parse_json_object, LlmSynthesizer, NullSynthesizer};
