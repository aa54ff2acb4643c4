//! Contextual relevance: gathers every signal for an origin note, ranks the
//! candidates and explains each one.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};
use uuid::Uuid;

use ponder_core::logging::{COMPONENT_CONTEXT, SUBSYSTEM_THINKING};
use ponder_core::{Candidate, ContextStore, Error, NoteRef, Result, ScoringWeights};

use crate::signals::{self, SignalSet};

/// Separator between justification labels.
pub const REASON_SEPARATOR: &str = " · ";

/// Label used when no known signal explains a candidate.
pub const FALLBACK_REASON: &str = "Related note";

const REASON_DIRECT_LINK: &str = "Direct link";
const REASON_SECOND_HOP: &str = "Linked through a neighbor";
const REASON_SHARED_TAG: &str = "Shared tag";
const REASON_SAME_FOLDER: &str = "Same folder";
const REASON_RECENTLY_UPDATED: &str = "Recently updated";

/// Ranked candidates for one origin note.
#[derive(Debug, Clone)]
pub struct ContextualNotes {
    pub origin: NoteRef,
    /// Best first, at most `limit` long.
    pub candidates: Vec<Candidate>,
    /// The candidates' notes in the order the store returned them.
    pub notes: Vec<NoteRef>,
}

impl ContextualNotes {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn note(&self, id: Uuid) -> Option<&NoteRef> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn candidate(&self, id: Uuid) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.note_id == id)
    }

    /// Candidate ids in rank order.
    pub fn candidate_ids(&self) -> Vec<Uuid> {
        self.candidates.iter().map(|c| c.note_id).collect()
    }
}

/// Justification for one candidate from the signals that found it.
///
/// Labels follow a fixed priority: direct link, second hop, shared tag, same
/// folder, recently updated. A candidate matched by none of these gets
/// [`FALLBACK_REASON`].
pub fn build_reason(note_id: Uuid, signals: &SignalSet) -> String {
    let labels: Vec<&str> = [
        (&signals.direct, REASON_DIRECT_LINK),
        (&signals.second_hop, REASON_SECOND_HOP),
        (&signals.tags, REASON_SHARED_TAG),
        (&signals.folder, REASON_SAME_FOLDER),
        (&signals.recency, REASON_RECENTLY_UPDATED),
    ]
    .into_iter()
    .filter(|(map, _)| map.contains_key(&note_id))
    .map(|(_, label)| label)
    .collect();

    if labels.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        labels.join(REASON_SEPARATOR)
    }
}

/// Descending score, ties broken by ascending id.
fn by_score_desc(a: &(Uuid, f64), b: &(Uuid, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

/// Scores and ranks notes related to an origin note.
#[derive(Clone)]
pub struct ContextScorer {
    store: Arc<dyn ContextStore>,
    weights: ScoringWeights,
}

impl ContextScorer {
    pub fn new(store: Arc<dyn ContextStore>, weights: ScoringWeights) -> Self {
        Self { store, weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Top `limit` candidates for `note_id`.
    ///
    /// Fails with [`Error::NoteNotFound`] when the origin does not exist.
    pub async fn get_contextual_notes(
        &self,
        note_id: Uuid,
        recent: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        Ok(self
            .rank_at(note_id, recent, limit, Utc::now())
            .await?
            .candidates)
    }

    /// Load the origin and rank its candidates as of `now`.
    pub async fn rank_at(
        &self,
        note_id: Uuid,
        recent: &[Uuid],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<ContextualNotes> {
        let origin = self
            .store
            .find_note_by_id(note_id)
            .await?
            .ok_or(Error::NoteNotFound(note_id))?;
        self.rank_for(origin, recent, limit, now).await
    }

    /// Rank candidates for an already loaded origin note.
    pub async fn rank_for(
        &self,
        origin: NoteRef,
        recent: &[Uuid],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<ContextualNotes> {
        let start = Instant::now();
        let (signals, known) = self.collect_signals(&origin, recent, now).await?;

        // Ids the store could not date (deleted notes, stale recent ids) go
        // before truncation so they never take a slot.
        let mut totals = signals.merged();
        totals.retain(|id, _| known.contains(id));
        for (id, boost) in &signals.recency {
            if let Some(total) = totals.get_mut(id) {
                *total += boost;
            }
        }

        let mut ranked: Vec<(Uuid, f64)> = totals.into_iter().collect();
        ranked.sort_by(by_score_desc);
        ranked.truncate(limit);

        let ranked_ids: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
        let mut notes = self.store.find_notes_by_ids(&ranked_ids).await?;
        notes.retain(|n| ranked_ids.contains(&n.id));
        let titles: HashMap<Uuid, &str> = notes.iter().map(|n| (n.id, n.title.as_str())).collect();

        let candidates: Vec<Candidate> = ranked
            .iter()
            .filter_map(|(id, score)| {
                let title = titles.get(id)?;
                trace!(note_id = %id, score = *score, "Ranked candidate");
                Some(Candidate {
                    note_id: *id,
                    title: title.to_string(),
                    score: *score,
                    reason: build_reason(*id, &signals),
                })
            })
            .collect();

        debug!(
            subsystem = SUBSYSTEM_THINKING,
            component = COMPONENT_CONTEXT,
            op = "rank",
            note_id = %origin.id,
            direct = signals.direct.len(),
            second_hop = signals.second_hop.len(),
            tags = signals.tags.len(),
            folder = signals.folder.len(),
            recent_view = signals.recent_view.len(),
            candidate_count = candidates.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Contextual notes ranked"
        );

        Ok(ContextualNotes {
            origin,
            candidates,
            notes,
        })
    }

    /// Run every scorer. Also returns the ids the store could date.
    async fn collect_signals(
        &self,
        origin: &NoteRef,
        recent: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<(SignalSet, HashSet<Uuid>)> {
        let w = &self.weights;
        let mut set = SignalSet::default();

        let links = self.store.find_links_by_endpoint(origin.id).await?;
        set.direct = signals::direct_links(origin.id, &links, w);

        let first_hop: HashSet<Uuid> = set.direct.keys().copied().collect();
        if !first_hop.is_empty() {
            let hop_ids: Vec<Uuid> = first_hop.iter().copied().collect();
            let hop_links = self.store.find_links_by_endpoints(&hop_ids).await?;
            set.second_hop = signals::second_hop(origin.id, &first_hop, &hop_links, w);
        }

        let tags = self.store.find_tags_for_note(origin.id).await?;
        if !tags.is_empty() {
            let memberships = self.store.find_notes_by_tag_ids(&tags, origin.id).await?;
            set.tags = signals::shared_tags(origin.id, &memberships, w);
        }

        if let Some(folder_id) = origin.folder_id {
            let members = self
                .store
                .find_notes_by_folder_id(folder_id, origin.id)
                .await?;
            set.folder = signals::same_folder(origin.id, &members, w);
        }

        set.recent_view = signals::recent_views(origin.id, recent, w);

        let discovered: Vec<Uuid> = set.merged().into_keys().collect();
        if discovered.is_empty() {
            return Ok((set, HashSet::new()));
        }
        let updated_at = self.store.find_updated_at_by_ids(&discovered).await?;
        set.recency = signals::recency(&updated_at, now, w);
        let known = updated_at.iter().map(|(id, _)| *id).collect();

        Ok((set, known))
    }
}
