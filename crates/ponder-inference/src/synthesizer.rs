//! Synthesizer implementations.
//!
//! [`LlmSynthesizer`] turns a [`SynthesisRequest`] into a JSON-mode chat call on
//! any [`GenerationBackend`] and parses the answer leniently. [`NullSynthesizer`]
//! stands in when no model is configured.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::debug;

use ponder_core::{GenerationBackend, SynthesisError, SynthesisRequest, Synthesizer};

/// Synthesizer backed by a generation model.
pub struct LlmSynthesizer {
    backend: Arc<dyn GenerationBackend>,
}

impl LlmSynthesizer {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// System prompt with the expected JSON shape appended.
    fn system_prompt(request: &SynthesisRequest) -> String {
        format!(
            "{}\n\nRespond with a single JSON object of this shape and nothing else:\n{}",
            request.system.trim_end(),
            request.response_format
        )
    }
}

#[async_trait]
impl Synthesizer for LlmSynthesizer {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> std::result::Result<JsonValue, SynthesisError> {
        let system = Self::system_prompt(request);
        let raw = self
            .backend
            .generate_json_with_system(&system, &request.prompt)
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        debug!(
            subsystem = "inference",
            component = "synthesizer",
            model = self.backend.model_name(),
            response_len = raw.len(),
            "Synthesis response received"
        );

        parse_json_object(&raw).ok_or_else(|| {
            SynthesisError::Malformed(format!(
                "no JSON object in model output ({} chars)",
                raw.len()
            ))
        })
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        self.backend.model_name()
    }
}

/// Synthesizer used when no model is configured. Every call is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSynthesizer;

#[async_trait]
impl Synthesizer for NullSynthesizer {
    async fn synthesize(
        &self,
        _request: &SynthesisRequest,
    ) -> std::result::Result<JsonValue, SynthesisError> {
        Err(SynthesisError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Extract a JSON object from model output.
///
/// Accepts bare JSON, fenced code blocks, a leading `<think>` block, and
/// prose around a single `{...}` span. Returns `None` unless the result is
/// an object.
pub fn parse_json_object(raw: &str) -> Option<JsonValue> {
    let text = strip_thinking(raw).trim();

    if let Ok(value @ JsonValue::Object(_)) = serde_json::from_str::<JsonValue>(text) {
        return Some(value);
    }

    let unfenced = text
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if let Ok(value @ JsonValue::Object(_)) = serde_json::from_str::<JsonValue>(unfenced) {
        return Some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<JsonValue>(&unfenced[start..=end]) {
        Ok(value @ JsonValue::Object(_)) => Some(value),
        _ => None,
    }
}

/// Drop everything up to the last `</think>` tag.
fn strip_thinking(raw: &str) -> &str {
    match raw.rfind("</think>") {
        Some(idx) => &raw[idx + "</think>".len()..],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponder_core::{Error, Result};
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedBackend {
        response: Result<String>,
        seen_system: Mutex<Option<String>>,
    }

    impl CannedBackend {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                seen_system: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for CannedBackend {
        async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
            self.generate_json_with_system(system, prompt).await
        }

        async fn generate_json_with_system(&self, system: &str, _prompt: &str) -> Result<String> {
            *self.seen_system.lock().unwrap() = Some(system.to_string());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Inference(e.to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn request() -> SynthesisRequest {
        SynthesisRequest {
            system: "You compare notes.".to_string(),
            prompt: "Origin: A".to_string(),
            response_format: json!({"reason": "string"}),
        }
    }

    #[test]
    fn test_parse_bare_object() {
        assert_eq!(parse_json_object(r#"{"a": 1}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_parse_fenced_object() {
        let raw = "```json\n{\"reason\": \"both discuss sleep\"}\n```";
        assert_eq!(
            parse_json_object(raw),
            Some(json!({"reason": "both discuss sleep"}))
        );
    }

    #[test]
    fn test_parse_object_inside_prose() {
        let raw = "Sure! Here you go: {\"title\": \"Bridge\"} Hope that helps.";
        assert_eq!(parse_json_object(raw), Some(json!({"title": "Bridge"})));
    }

    #[test]
    fn test_parse_after_think_block() {
        let raw = "<think>{\"draft\": true}</think>\n{\"title\": \"Final\"}";
        assert_eq!(parse_json_object(raw), Some(json!({"title": "Final"})));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert_eq!(parse_json_object("[1, 2]"), None);
        assert_eq!(parse_json_object("no json here"), None);
        assert_eq!(parse_json_object("} backwards {"), None);
        assert_eq!(parse_json_object(""), None);
    }

    #[tokio::test]
    async fn test_llm_synthesizer_appends_shape_to_system() {
        let backend = Arc::new(CannedBackend::ok(r#"{"reason": "shared tag"}"#));
        let synth = LlmSynthesizer::new(backend.clone());

        let value = synth.synthesize(&request()).await.unwrap();
        assert_eq!(value["reason"], "shared tag");
        assert!(synth.is_available());
        assert_eq!(synth.name(), "canned");

        let system = backend.seen_system.lock().unwrap().clone().unwrap();
        assert!(system.starts_with("You compare notes."));
        assert!(system.contains(r#"{"reason":"string"}"#));
    }

    #[tokio::test]
    async fn test_llm_synthesizer_malformed() {
        let synth = LlmSynthesizer::new(Arc::new(CannedBackend::ok("I refuse.")));
        let err = synth.synthesize(&request()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_llm_synthesizer_request_failure() {
        let backend = CannedBackend {
            response: Err(Error::Inference("connection refused".to_string())),
            seen_system: Mutex::new(None),
        };
        let synth = LlmSynthesizer::new(Arc::new(backend));
        let err = synth.synthesize(&request()).await.unwrap_err();
        match err {
            SynthesisError::Request(msg) => assert!(msg.contains("connection refused")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_null_synthesizer_is_unavailable() {
        let synth = NullSynthesizer;
        assert!(!synth.is_available());
        assert_eq!(synth.name(), "none");
        let err = synth.synthesize(&request()).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
