//! End-to-end behaviour of the thinking commands over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use uuid::Uuid;

use ponder_db::InMemoryStore;
use ponder_inference::mock::ScriptedSynthesizer;
use ponder_inference::NullSynthesizer;
use ponder_thinking::{
    ContextScorer, Error, ScoringWeights, SynthesisError, Synthesizer, ThinkingCommand,
    ThinkingConfig, ThinkingEngine, FALLBACK_REASON,
};

fn engine_with(
    store: &Arc<InMemoryStore>,
    synth: Arc<dyn Synthesizer>,
    config: ThinkingConfig,
) -> ThinkingEngine {
    ThinkingEngine::new(store.clone(), store.clone(), synth, config)
}

fn offline_engine(store: &Arc<InMemoryStore>) -> ThinkingEngine {
    engine_with(store, Arc::new(NullSynthesizer), ThinkingConfig::default())
}

fn scripted_engine(store: &Arc<InMemoryStore>, synth: &ScriptedSynthesizer) -> ThinkingEngine {
    engine_with(store, Arc::new(synth.clone()), ThinkingConfig::default())
}

fn stale() -> chrono::DateTime<Utc> {
    Utc::now() - ChronoDuration::days(30)
}

/// Origin A links to B, shares "research" with C and a folder with D.
struct Scenario {
    store: Arc<InMemoryStore>,
    a: Uuid,
    b: Uuid,
    c: Uuid,
    d: Uuid,
}

fn scenario() -> Scenario {
    let store = Arc::new(InMemoryStore::new());
    let folder = Uuid::new_v4();
    let a = store.add_note("Sleep debt", "Short sleep compounds over a week.", Some(folder));
    let d = store.add_note("Morning light", "Light exposure shifts the clock.", Some(folder));
    let c = store.add_note("Caffeine", "Adenosine receptors get blocked.", None);
    let b = store.add_note("Naps", "Twenty minutes restores alertness.", None);
    store.add_link(a, b);
    store.tag_note(a, "research");
    store.tag_note(c, "research");
    Scenario { store, a, b, c, d }
}

// =============================================================================
// RANKING
// =============================================================================

#[tokio::test]
async fn test_isolated_note_yields_empty_session() {
    let store = Arc::new(InMemoryStore::new());
    let origin = store.add_note("Alone", "Nothing points here.", None);
    let _other = store.add_note("Unrelated", "", None);
    let engine = offline_engine(&store);

    let response = engine.connect(origin, &[]).await.unwrap();
    assert!(response.results.is_empty());
    assert_eq!(response.command, ThinkingCommand::Connect);

    let session = store.session(response.session_id).unwrap();
    assert!(session.output.is_empty());
    assert!(session.input.is_empty());
    assert_eq!(store.session_count(), 1);

    let response = engine.bridge(origin, &[]).await.unwrap();
    assert!(response.results.is_empty());
    assert_eq!(store.session_count(), 2);
}

#[tokio::test]
async fn test_two_shared_tags_score_forty() {
    let store = Arc::new(InMemoryStore::new());
    let origin = store.add_note_at("Origin", "", None, stale());
    let other = store.add_note_at("Other", "", None, stale());
    for tag in ["sleep", "research"] {
        store.tag_note(origin, tag);
        store.tag_note(other, tag);
    }

    let scorer = ContextScorer::new(store.clone(), ScoringWeights::default());
    let candidates = scorer.get_contextual_notes(origin, &[], 5).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].score, 40.0);
    assert_eq!(candidates[0].reason, "Shared tag");
}

#[tokio::test]
async fn test_rank_follows_weight_precedence() {
    let s = scenario();
    let scorer = ContextScorer::new(s.store.clone(), ScoringWeights::default());

    let candidates = scorer.get_contextual_notes(s.a, &[], 5).await.unwrap();
    let order: Vec<Uuid> = candidates.iter().map(|c| c.note_id).collect();
    assert_eq!(order, vec![s.b, s.c, s.d]);
    assert!(candidates.iter().all(|c| c.note_id != s.a));
    assert!(candidates[0].reason.starts_with("Direct link"));
    assert!(candidates[1].reason.starts_with("Shared tag"));
    assert!(candidates[2].reason.starts_with("Same folder"));
}

#[tokio::test]
async fn test_second_hop_scored_once_and_excludes_neighbors() {
    let store = Arc::new(InMemoryStore::new());
    let origin = store.add_note_at("Origin", "", None, stale());
    let b = store.add_note_at("B", "", None, stale());
    let c = store.add_note_at("C", "", None, stale());
    let far = store.add_note_at("Far", "", None, stale());
    store.add_link(origin, b);
    store.add_link(origin, c);
    store.add_link(b, c);
    store.add_link(b, far);
    store.add_link(far, c);

    let scorer = ContextScorer::new(store.clone(), ScoringWeights::default());
    let candidates = scorer.get_contextual_notes(origin, &[], 5).await.unwrap();

    assert_eq!(candidates.len(), 3);
    let far_candidate = candidates.iter().find(|c| c.note_id == far).unwrap();
    assert_eq!(far_candidate.score, 25.0);
    assert_eq!(far_candidate.reason, "Linked through a neighbor");
    let b_candidate = candidates.iter().find(|c| c.note_id == b).unwrap();
    assert_eq!(b_candidate.score, 50.0);
}

#[tokio::test]
async fn test_deleted_neighbor_does_not_bridge_second_hop() {
    let store = Arc::new(InMemoryStore::new());
    let origin = store.add_note("Origin", "", None);
    let gone = store.add_note("Gone", "", None);
    let far = store.add_note("Far", "", None);
    store.add_link(origin, gone);
    store.add_link(gone, far);
    store.soft_delete(gone);

    let scorer = ContextScorer::new(store.clone(), ScoringWeights::default());
    let candidates = scorer.get_contextual_notes(origin, &[], 5).await.unwrap();
    assert!(candidates.is_empty());

    let response = offline_engine(&store).connect(origin, &[]).await.unwrap();
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_limit_caps_candidates() {
    let store = Arc::new(InMemoryStore::new());
    let folder = Uuid::new_v4();
    let origin = store.add_note("Origin", "", Some(folder));
    for i in 0..8 {
        store.add_note(&format!("Sibling {}", i), "", Some(folder));
    }

    let scorer = ContextScorer::new(store.clone(), ScoringWeights::default());
    assert_eq!(scorer.get_contextual_notes(origin, &[], 5).await.unwrap().len(), 5);
    assert_eq!(scorer.get_contextual_notes(origin, &[], 3).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_recent_view_decay() {
    let store = Arc::new(InMemoryStore::new());
    let origin = store.add_note_at("Origin", "", None, stale());
    let x = store.add_note_at("X", "", None, stale());
    let y = store.add_note_at("Y", "", None, stale());
    let z = store.add_note_at("Z", "", None, stale());

    let scorer = ContextScorer::new(store.clone(), ScoringWeights::default());
    let candidates = scorer
        .get_contextual_notes(origin, &[x, y, z], 5)
        .await
        .unwrap();

    let scores: Vec<(Uuid, f64)> = candidates.iter().map(|c| (c.note_id, c.score)).collect();
    assert_eq!(scores[0], (x, 30.0));
    assert_eq!(scores[1].0, y);
    assert!((scores[1].1 - 27.0).abs() < 1e-9);
    assert_eq!(scores[2].0, z);
    assert!((scores[2].1 - 24.0).abs() < 1e-9);
    assert!(candidates.iter().all(|c| c.reason == FALLBACK_REASON));
}

#[tokio::test]
async fn test_alternate_weights_change_order() {
    let s = scenario();
    let weights = ScoringWeights {
        same_folder: 100.0,
        ..ScoringWeights::default()
    };
    let scorer = ContextScorer::new(s.store.clone(), weights);

    let candidates = scorer.get_contextual_notes(s.a, &[], 5).await.unwrap();
    assert_eq!(candidates[0].note_id, s.d);
}

#[tokio::test]
async fn test_missing_origin_fails_without_session() {
    let store = Arc::new(InMemoryStore::new());
    let engine = offline_engine(&store);
    let missing = Uuid::new_v4();

    for command in ThinkingCommand::ALL {
        let err = engine.run(command, missing, &[]).await.unwrap_err();
        assert!(matches!(err, Error::NoteNotFound(id) if id == missing));
    }
    assert_eq!(store.session_count(), 0);
}

#[tokio::test]
async fn test_deleted_origin_is_not_found() {
    let s = scenario();
    s.store.soft_delete(s.a);
    let err = offline_engine(&s.store).connect(s.a, &[]).await.unwrap_err();
    assert!(matches!(err, Error::NoteNotFound(_)));
}

// =============================================================================
// SESSIONS
// =============================================================================

#[tokio::test]
async fn test_session_expires_exactly_one_day_later() {
    let s = scenario();
    let engine = offline_engine(&s.store);

    for command in ThinkingCommand::ALL {
        let response = engine.run(command, s.a, &[]).await.unwrap();
        let session = s.store.session(response.session_id).unwrap();
        assert_eq!(
            session.expires_at_utc - session.created_at_utc,
            ChronoDuration::hours(24)
        );
        assert_eq!(response.expires_at, session.expires_at_utc);
        assert_eq!(session.command, command);
        assert_eq!(session.note_id, s.a);
        assert!(session.saved_ids.is_empty());
    }
    assert_eq!(s.store.session_count(), 4);
}

#[tokio::test]
async fn test_session_input_is_rank_order() {
    let s = scenario();
    let response = offline_engine(&s.store).combine(s.a, &[]).await.unwrap();
    let session = s.store.session(response.session_id).unwrap();
    assert_eq!(session.input, vec![s.b, s.c, s.d]);
}

#[tokio::test]
async fn test_session_write_failure_propagates() {
    let s = scenario();
    s.store.set_fail_writes(true);
    let err = offline_engine(&s.store).connect(s.a, &[]).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

// =============================================================================
// CONNECT
// =============================================================================

#[tokio::test]
async fn test_connect_stores_all_returns_two() {
    let s = scenario();
    let response = offline_engine(&s.store).connect(s.a, &[]).await.unwrap();

    assert_eq!(response.results.len(), 2);
    assert_eq!(response.results[0].note_id, s.b);
    assert_eq!(response.results[1].note_id, s.c);
    assert_eq!(
        response.results[0].preview.as_deref(),
        Some("Twenty minutes restores alertness.")
    );
    assert!(response.results[0].content.is_none());

    let session = s.store.session(response.session_id).unwrap();
    assert_eq!(session.output.len(), 3);
    assert_eq!(session.output[..2], response.results[..]);
}

#[tokio::test]
async fn test_connect_uses_synthesized_reasons() {
    let s = scenario();
    let synth = ScriptedSynthesizer::new().with_response(json!({
        "reasons": [{"note_id": s.b.to_string(), "reason": "Naps repay part of the debt"}]
    }));
    let response = scripted_engine(&s.store, &synth).connect(s.a, &[]).await.unwrap();

    assert_eq!(response.results[0].reason, "Naps repay part of the debt");
    assert!(response.results[1].reason.starts_with("Shared tag"));
    assert_eq!(synth.call_count(), 1);

    let request = &synth.calls()[0];
    assert!(request.prompt.contains("Sleep debt"));
    assert!(request.prompt.contains(&s.d.to_string()));
    assert!(request.response_format.get("reasons").is_some());
}

#[tokio::test]
async fn test_connect_request_failure_keeps_heuristic_reasons() {
    let s = scenario();
    let synth = ScriptedSynthesizer::new()
        .with_error(SynthesisError::Request("connection refused".to_string()));
    let enhanced = scripted_engine(&s.store, &synth).connect(s.a, &[]).await.unwrap();
    let offline = offline_engine(&s.store).connect(s.a, &[]).await.unwrap();

    let reasons = |r: &ponder_thinking::ThinkingResponse| -> Vec<String> {
        r.results.iter().map(|x| x.reason.clone()).collect()
    };
    assert_eq!(reasons(&enhanced), reasons(&offline));
}

#[tokio::test]
async fn test_connect_without_candidates_skips_synthesizer() {
    let store = Arc::new(InMemoryStore::new());
    let origin = store.add_note("Alone", "", None);
    let synth = ScriptedSynthesizer::new().with_response(json!({"reasons": []}));

    scripted_engine(&store, &synth).connect(origin, &[]).await.unwrap();
    assert_eq!(synth.call_count(), 0);
}

// =============================================================================
// SELECTIVE COMMANDS
// =============================================================================

#[tokio::test]
async fn test_selective_commands_return_one_candidate() {
    let s = scenario();
    let engine = offline_engine(&s.store);
    let candidates = [s.b, s.c, s.d];

    for (command, heading) in [
        (ThinkingCommand::Contrast, "## Divergence"),
        (ThinkingCommand::Combine, "## Shared ground"),
        (ThinkingCommand::Bridge, "## The gap"),
    ] {
        let response = engine.run(command, s.a, &[]).await.unwrap();
        assert_eq!(response.results.len(), 1);
        let result = &response.results[0];
        assert!(candidates.contains(&result.note_id));
        assert_ne!(result.note_id, s.a);
        assert!(result.content.as_deref().unwrap().contains(heading));
        assert!(result.result_title.is_some());

        let session = s.store.session(response.session_id).unwrap();
        assert_eq!(session.output, response.results);
    }
}

#[tokio::test]
async fn test_offline_fallback_takes_first_store_note() {
    let s = scenario();
    // D was inserted before C and B, so it leads the store order.
    let response = offline_engine(&s.store).contrast(s.a, &[]).await.unwrap();
    let result = &response.results[0];
    assert_eq!(result.note_id, s.d);
    assert_eq!(result.result_title.as_deref(), Some("Sleep debt vs. Morning light"));
    assert!(result.reason.starts_with("Same folder"));
}

#[tokio::test]
async fn test_offline_output_is_deterministic() {
    let s = scenario();
    let engine = offline_engine(&s.store);

    let first = engine.combine(s.a, &[]).await.unwrap();
    let second = engine.combine(s.a, &[]).await.unwrap();
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(first.results, second.results);
}

#[tokio::test]
async fn test_synthesized_selection_is_used() {
    let s = scenario();
    let synth = ScriptedSynthesizer::new().with_response(json!({
        "selected_note_id": s.c.to_string(),
        "reason": "Caffeine masks the debt instead of repaying it",
        "content": "## Divergence\nOne hides, one heals.",
        "title": "Masking vs. repaying"
    }));
    let response = scripted_engine(&s.store, &synth).contrast(s.a, &[]).await.unwrap();

    let result = &response.results[0];
    assert_eq!(result.note_id, s.c);
    assert_eq!(result.note_title, "Caffeine");
    assert_eq!(result.reason, "Caffeine masks the debt instead of repaying it");
    assert_eq!(result.content.as_deref(), Some("## Divergence\nOne hides, one heals."));
    assert_eq!(result.result_title.as_deref(), Some("Masking vs. repaying"));
}

#[tokio::test]
async fn test_selection_outside_candidates_falls_back_to_first() {
    let s = scenario();
    for bogus in [Uuid::new_v4().to_string(), s.a.to_string(), "n/a".to_string()] {
        let synth = ScriptedSynthesizer::new().with_response(json!({
            "selected_note_id": bogus,
            "reason": "A bridge through chronobiology",
            "content": "## The gap\n..."
        }));
        let response = scripted_engine(&s.store, &synth).bridge(s.a, &[]).await.unwrap();

        let result = &response.results[0];
        assert_eq!(result.note_id, s.d);
        assert_eq!(result.reason, "A bridge through chronobiology");
        assert_eq!(
            result.result_title.as_deref(),
            Some("From Sleep debt to Morning light")
        );
    }
}

#[tokio::test]
async fn test_malformed_selection_uses_template() {
    let s = scenario();
    let synth = ScriptedSynthesizer::new().with_response(json!({"selected_note_id": s.b.to_string()}));
    let scripted = scripted_engine(&s.store, &synth).combine(s.a, &[]).await.unwrap();
    let offline = offline_engine(&s.store).combine(s.a, &[]).await.unwrap();

    assert_eq!(scripted.results, offline.results);
}

#[tokio::test(start_paused = true)]
async fn test_slow_synthesizer_times_out_to_template() {
    let s = scenario();
    let synth = ScriptedSynthesizer::new()
        .with_response(json!({
            "selected_note_id": s.b.to_string(),
            "reason": "too late",
            "content": "too late"
        }))
        .with_delay(Duration::from_secs(5));
    let config = ThinkingConfig::default().with_synthesis_timeout(Duration::from_millis(100));
    let engine = engine_with(&s.store, Arc::new(synth.clone()), config);

    let response = engine.contrast(s.a, &[]).await.unwrap();
    let result = &response.results[0];
    assert_eq!(result.note_id, s.d);
    assert_ne!(result.reason, "too late");
    assert!(result.content.as_deref().unwrap().contains("## Tension"));
    assert_eq!(synth.call_count(), 1);
}
