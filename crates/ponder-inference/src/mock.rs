//! Scripted synthesizer for deterministic testing.
//!
//! ## Usage
//!
//! ```rust
//! use ponder_inference::mock::ScriptedSynthesizer;
//! use serde_json::json;
//!
//! let synth = ScriptedSynthesizer::new()
//!     .with_response(json!({"reason": "both cite Walker"}))
//!     .with_unavailable();
//! assert_eq!(synth.remaining(), 2);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use ponder_core::{SynthesisError, SynthesisRequest, Synthesizer};

type Scripted = std::result::Result<JsonValue, SynthesisError>;

/// Synthesizer that replays a queue of canned answers.
///
/// Once the queue is drained every call returns
/// [`SynthesisError::Unavailable`]. Every request is logged.
#[derive(Clone, Default)]
pub struct ScriptedSynthesizer {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<SynthesisRequest>>>,
    delay: Option<Duration>,
}

impl ScriptedSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer.
    pub fn with_response(self, value: JsonValue) -> Self {
        self.push(Ok(value));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: SynthesisError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn with_unavailable(self) -> Self {
        self.with_error(SynthesisError::Unavailable)
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(&self, item: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
    }

    /// Requests received so far, oldest first.
    pub fn calls(&self) -> Vec<SynthesisRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Answers still queued.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Scripted {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Err(SynthesisError::Unavailable))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
