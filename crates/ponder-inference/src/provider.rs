//! Synthesizer selection from configuration.
//!
//! The provider is chosen once at startup. Anything that cannot produce a
//! working backend (provider `none`, a missing API key, a backend compiled
//! out) yields a [`NullSynthesizer`], so thinking commands keep working on
//! their deterministic fallbacks.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use ponder_core::{defaults, Synthesizer};

use crate::synthesizer::{LlmSynthesizer, NullSynthesizer};

/// Which generation provider backs the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisProvider {
    #[default]
    None,
    Ollama,
    OpenAI,
}

impl FromStr for SynthesisProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            other => Err(format!(
                "Unknown synthesis provider: {}. Valid values: none, ollama, openai",
                other
            )),
        }
    }
}

impl std::fmt::Display for SynthesisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

/// Everything needed to build a synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizerConfig {
    pub provider: SynthesisProvider,
    pub ollama_base: String,
    pub ollama_model: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gen_timeout_secs: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::None,
            ollama_base: defaults::OLLAMA_URL.to_string(),
            ollama_model: defaults::GEN_MODEL.to_string(),
            openai_base_url: defaults::OPENAI_URL.to_string(),
            openai_api_key: None,
            openai_model: defaults::OPENAI_GEN_MODEL.to_string(),
            gen_timeout_secs: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

impl SynthesizerConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Reads `PONDER_SYNTH_PROVIDER`, `OLLAMA_BASE`, `OLLAMA_GEN_MODEL`,
    /// `OPENAI_BASE_URL`, `OPENAI_API_KEY`, `OPENAI_GEN_MODEL` and
    /// `PONDER_GEN_TIMEOUT_SECS`. An unknown provider is logged and treated
    /// as `none`.
    pub fn from_env() -> Self {
        let base = Self::default();
        let provider = match std::env::var("PONDER_SYNTH_PROVIDER") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!(subsystem = "inference", error = %e, "Ignoring PONDER_SYNTH_PROVIDER");
                SynthesisProvider::None
            }),
            Err(_) => SynthesisProvider::None,
        };

        Self {
            provider,
            ollama_base: std::env::var("OLLAMA_BASE").unwrap_or(base.ollama_base),
            ollama_model: std::env::var("OLLAMA_GEN_MODEL").unwrap_or(base.ollama_model),
            openai_base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(base.openai_base_url),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_model: std::env::var("OPENAI_GEN_MODEL").unwrap_or(base.openai_model),
            gen_timeout_secs: std::env::var("PONDER_GEN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.gen_timeout_secs),
        }
    }

    pub fn with_provider(mut self, provider: SynthesisProvider) -> Self {
        self.provider = provider;
        self
    }
}

/// Build the synthesizer described by `config`.
pub fn build_synthesizer(config: &SynthesizerConfig) -> Arc<dyn Synthesizer> {
    let synth: Arc<dyn Synthesizer> = match config.provider {
        SynthesisProvider::None => Arc::new(NullSynthesizer),
        SynthesisProvider::Ollama => build_ollama(config),
        SynthesisProvider::OpenAI => build_openai(config),
    };

    info!(
        subsystem = "inference",
        component = "synthesizer",
        provider = %config.provider,
        synthesizer = synth.name(),
        available = synth.is_available(),
        "Synthesizer configured"
    );
    synth
}

#[cfg(feature = "ollama")]
fn build_ollama(config: &SynthesizerConfig) -> Arc<dyn Synthesizer> {
    let backend = crate::ollama::OllamaBackend::with_config(
        config.ollama_base.clone(),
        config.ollama_model.clone(),
        config.gen_timeout_secs,
    );
    Arc::new(LlmSynthesizer::new(Arc::new(backend)))
}

#[cfg(not(feature = "ollama"))]
fn build_ollama(_config: &SynthesizerConfig) -> Arc<dyn Synthesizer> {
    warn!(
        subsystem = "inference",
        "Ollama support not compiled in, synthesis disabled"
    );
    Arc::new(NullSynthesizer)
}

#[cfg(feature = "openai")]
fn build_openai(config: &SynthesizerConfig) -> Arc<dyn Synthesizer> {
    use crate::openai::{OpenAIBackend, OpenAIConfig};

    let Some(api_key) = config.openai_api_key.clone() else {
        warn!(
            subsystem = "inference",
            "OPENAI_API_KEY not set, synthesis disabled"
        );
        return Arc::new(NullSynthesizer);
    };

    let backend = OpenAIBackend::new(OpenAIConfig {
        base_url: config.openai_base_url.clone(),
        api_key: Some(api_key),
        gen_model: config.openai_model.clone(),
        timeout_seconds: config.gen_timeout_secs,
    });
    match backend {
        Ok(backend) => Arc::new(LlmSynthesizer::new(Arc::new(backend))),
        Err(e) => {
            warn!(subsystem = "inference", error = %e, "OpenAI backend unavailable, synthesis disabled");
            Arc::new(NullSynthesizer)
        }
    }
}

#[cfg(not(feature = "openai"))]
fn build_openai(_config: &SynthesizerConfig) -> Arc<dyn Synthesizer> {
    warn!(
        subsystem = "inference",
        "OpenAI support not compiled in, synthesis disabled"
    );
    Arc::new(NullSynthesizer)
}
