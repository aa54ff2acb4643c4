//! Engine configuration.
//!
//! [`ScoringWeights`] is immutable once built and is injected into the scorer,
//! so tests can run the pipeline with alternate weight sets. It is never read
//! from the environment. [`ThinkingConfig`] carries the remaining knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::defaults;

/// Weights of the relevance signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub direct_link: f64,
    pub second_hop: f64,
    pub same_tag: f64,
    pub same_folder: f64,
    pub recent_view: f64,
    pub recency: f64,
    pub recency_window_days: f64,
    pub recent_view_step: f64,
    pub recent_view_floor: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            direct_link: defaults::DIRECT_LINK,
            second_hop: defaults::SECOND_HOP,
            same_tag: defaults::SAME_TAG,
            same_folder: defaults::SAME_FOLDER,
            recent_view: defaults::RECENT_VIEW,
            recency: defaults::RECENCY,
            recency_window_days: defaults::RECENCY_WINDOW_DAYS,
            recent_view_step: defaults::RECENT_VIEW_STEP,
            recent_view_floor: defaults::RECENT_VIEW_FLOOR,
        }
    }
}

impl ScoringWeights {
    /// Score of the recent-view entry at `index` (0 = most recent).
    pub fn recent_view_score(&self, index: usize) -> f64 {
        let decayed = self.recent_view * (1.0 - index as f64 * self.recent_view_step);
        decayed.max(self.recent_view * self.recent_view_floor)
    }

    /// Recency boost for a note last updated `age_days` ago.
    ///
    /// Linear decay to zero at the window edge; nothing beyond it. Future
    /// timestamps count as age zero.
    pub fn recency_score(&self, age_days: f64) -> f64 {
        let age = age_days.max(0.0);
        if age > self.recency_window_days {
            return 0.0;
        }
        self.recency * (1.0 - age / self.recency_window_days)
    }
}

/// Configuration for the thinking engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinkingConfig {
    pub weights: ScoringWeights,
    /// Ranked candidates every command considers.
    pub candidate_limit: usize,
    /// Connect results handed back to the caller (the session keeps all).
    pub connect_return_limit: usize,
    /// Preview length in characters.
    pub preview_length: usize,
    /// Characters of each note body included in prompts.
    pub excerpt_length: usize,
    /// Deadline for a single synthesizer call.
    pub synthesis_timeout: Duration,
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            candidate_limit: defaults::CANDIDATE_LIMIT,
            connect_return_limit: defaults::CONNECT_RETURN_LIMIT,
            preview_length: defaults::PREVIEW_LENGTH,
            excerpt_length: defaults::PROMPT_EXCERPT_LENGTH,
            synthesis_timeout: Duration::from_secs(defaults::SYNTHESIS_TIMEOUT_SECS),
        }
    }
}

impl ThinkingConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Reads `PONDER_SYNTHESIS_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("PONDER_SYNTHESIS_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.synthesis_timeout = Duration::from_secs(secs),
                _ => warn!(
                    value = %raw,
                    "Ignoring invalid PONDER_SYNTHESIS_TIMEOUT_SECS, using default"
                ),
            }
        }
        config
    }

    /// Replace the scoring weights.
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the synthesizer deadline.
    pub fn with_synthesis_timeout(mut self, timeout: Duration) -> Self {
        self.synthesis_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_view_decay() {
        let w = ScoringWeights::default();
        assert_eq!(w.recent_view_score(0), 30.0);
        assert!((w.recent_view_score(1) - 27.0).abs() < 1e-9);
        assert!((w.recent_view_score(2) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_view_floor() {
        let w = ScoringWeights::default();
        assert!((w.recent_view_score(5) - 15.0).abs() < 1e-9);
        assert_eq!(w.recent_view_score(6), 15.0);
        assert_eq!(w.recent_view_score(40), 15.0);
    }

    #[test]
    fn test_recency_decay() {
        let w = ScoringWeights::default();
        assert_eq!(w.recency_score(0.0), 10.0);
        assert!((w.recency_score(3.5) - 5.0).abs() < 1e-9);
        assert_eq!(w.recency_score(7.0), 0.0);
        assert_eq!(w.recency_score(7.5), 0.0);
        assert_eq!(w.recency_score(-1.0), 10.0);
    }

    #[test]
    fn test_alternate_weights() {
        let weights = ScoringWeights {
            recent_view: 100.0,
            ..ScoringWeights::default()
        };
        let config = ThinkingConfig::default().with_weights(weights);
        assert_eq!(config.weights.recent_view_score(0), 100.0);
        assert_eq!(config.candidate_limit, 5);
        assert_eq!(config.connect_return_limit, 2);
    }

    #[test]
    fn test_with_synthesis_timeout() {
        let config = ThinkingConfig::default().with_synthesis_timeout(Duration::from_millis(50));
        assert_eq!(config.synthesis_timeout, Duration::from_millis(50));
    }
}
