//! Relevance signals.
//!
//! Each scorer turns rows already fetched from the store into a
//! `note id -> score` map. None of them touch the store, so the weighting
//! rules can be tested without fixtures. The origin id never appears in any
//! map.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ponder_core::{NoteLink, NoteTag, ScoringWeights};

/// Scores keyed by note id.
pub type SignalMap = HashMap<Uuid, f64>;

/// Ids at the other end of every link touching `origin`. Self links are dropped.
pub fn neighbors(origin: Uuid, links: &[NoteLink]) -> HashSet<Uuid> {
    links
        .iter()
        .filter_map(|link| link.other_end(origin))
        .filter(|id| *id != origin)
        .collect()
}

/// Flat direct-link weight for every first-hop neighbor.
pub fn direct_links(origin: Uuid, links: &[NoteLink], weights: &ScoringWeights) -> SignalMap {
    neighbors(origin, links)
        .into_iter()
        .map(|id| (id, weights.direct_link))
        .collect()
}

/// Notes reachable through a first-hop neighbor.
///
/// `links` are the links touching any first-hop id. The origin and the
/// first-hop ids themselves are excluded. Several paths to the same note
/// still score the second-hop weight once.
pub fn second_hop(
    origin: Uuid,
    first_hop: &HashSet<Uuid>,
    links: &[NoteLink],
    weights: &ScoringWeights,
) -> SignalMap {
    let mut scores = SignalMap::new();
    for link in links {
        for (hop, other) in [
            (link.from_note_id, link.to_note_id),
            (link.to_note_id, link.from_note_id),
        ] {
            if !first_hop.contains(&hop) || other == origin || first_hop.contains(&other) {
                continue;
            }
            let entry = scores.entry(other).or_insert(0.0);
            *entry = entry.max(weights.second_hop);
        }
    }
    scores
}

/// Additive tag weight: one increment per shared tag.
///
/// `memberships` holds one row per (note, tag) pair among the origin's tags.
pub fn shared_tags(origin: Uuid, memberships: &[NoteTag], weights: &ScoringWeights) -> SignalMap {
    let mut seen = HashSet::new();
    let mut scores = SignalMap::new();
    for row in memberships {
        if row.note_id == origin || !seen.insert((row.note_id, row.tag.as_str())) {
            continue;
        }
        *scores.entry(row.note_id).or_insert(0.0) += weights.same_tag;
    }
    scores
}

/// Flat folder weight for every other note in the origin's folder.
pub fn same_folder(origin: Uuid, members: &[Uuid], weights: &ScoringWeights) -> SignalMap {
    members
        .iter()
        .filter(|id| **id != origin)
        .map(|id| (*id, weights.same_folder))
        .collect()
}

/// Position-decayed weight for recently viewed notes.
///
/// The origin is removed first and duplicates keep their first position, so
/// the decay index is the position in the cleaned list.
pub fn recent_views(origin: Uuid, recent: &[Uuid], weights: &ScoringWeights) -> SignalMap {
    let mut seen = HashSet::new();
    recent
        .iter()
        .filter(|id| **id != origin && seen.insert(**id))
        .enumerate()
        .map(|(index, id)| (*id, weights.recent_view_score(index)))
        .collect()
}

/// Recency boost for notes already in the candidate map.
///
/// Only ids present in `updated_at` are scored; this signal never introduces
/// a note on its own.
pub fn recency(
    updated_at: &[(Uuid, DateTime<Utc>)],
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> SignalMap {
    updated_at
        .iter()
        .filter_map(|(id, at)| {
            let age_days = (now - *at).num_milliseconds() as f64 / 86_400_000.0;
            let score = weights.recency_score(age_days);
            (score > 0.0).then_some((*id, score))
        })
        .collect()
}

/// Every signal computed for one origin, kept apart for justification.
#[derive(Debug, Clone, Default)]
pub struct SignalSet {
    pub direct: SignalMap,
    pub second_hop: SignalMap,
    pub tags: SignalMap,
    pub folder: SignalMap,
    pub recent_view: SignalMap,
    pub recency: SignalMap,
}

impl SignalSet {
    /// Sum of the discovery signals (everything except recency).
    pub fn merged(&self) -> SignalMap {
        let mut total = SignalMap::new();
        for map in [
            &self.direct,
            &self.second_hop,
            &self.tags,
            &self.folder,
            &self.recent_view,
        ] {
            for (id, score) in map {
                *total.entry(*id).or_insert(0.0) += score;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn tag(note_id: Uuid, tag: &str) -> NoteTag {
        NoteTag {
            note_id,
            tag: tag.to_string(),
        }
    }

    #[test]
    fn test_direct_links_are_symmetric_and_skip_self() {
        let w = ScoringWeights::default();
        let v = ids(3);
        let (origin, b, c) = (v[0], v[1], v[2]);
        let links = [
            NoteLink::new(origin, b),
            NoteLink::new(c, origin),
            NoteLink::new(origin, origin),
        ];

        let scores = direct_links(origin, &links, &w);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&b], 50.0);
        assert_eq!(scores[&c], 50.0);
        assert!(!scores.contains_key(&origin));
    }

    #[test]
    fn test_second_hop_excludes_origin_and_first_hop() {
        let w = ScoringWeights::default();
        let v = ids(5);
        let (origin, b, c, d, e) = (v[0], v[1], v[2], v[3], v[4]);
        let first: HashSet<Uuid> = [b, c].into_iter().collect();
        let links = [
            NoteLink::new(origin, b),
            NoteLink::new(b, c),
            NoteLink::new(b, d),
            NoteLink::new(e, c),
        ];

        let scores = second_hop(origin, &first, &links, &w);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&d], 25.0);
        assert_eq!(scores[&e], 25.0);
    }

    #[test]
    fn test_second_hop_multiple_paths_not_additive() {
        let w = ScoringWeights::default();
        let v = ids(4);
        let (origin, b, c, d) = (v[0], v[1], v[2], v[3]);
        let first: HashSet<Uuid> = [b, c].into_iter().collect();
        let links = [NoteLink::new(b, d), NoteLink::new(c, d), NoteLink::new(d, b)];

        let scores = second_hop(origin, &first, &links, &w);
        assert_eq!(scores[&d], 25.0);
    }

    #[test]
    fn test_shared_tags_additive() {
        let w = ScoringWeights::default();
        let v = ids(3);
        let (origin, b, c) = (v[0], v[1], v[2]);
        let rows = [
            tag(b, "research"),
            tag(b, "sleep"),
            tag(c, "sleep"),
            tag(b, "sleep"),
            tag(origin, "sleep"),
        ];

        let scores = shared_tags(origin, &rows, &w);
        assert_eq!(scores[&b], 40.0);
        assert_eq!(scores[&c], 20.0);
        assert!(!scores.contains_key(&origin));
    }

    #[test]
    fn test_same_folder_flat() {
        let w = ScoringWeights::default();
        let v = ids(3);
        let scores = same_folder(v[0], &[v[0], v[1], v[2]], &w);
        assert_eq!(scores.len(), 2);
        assert!(scores.values().all(|s| *s == 15.0));
    }

    #[test]
    fn test_recent_views_decay_and_floor() {
        let w = ScoringWeights::default();
        let origin = Uuid::new_v4();
        let recent = ids(8);

        let scores = recent_views(origin, &recent, &w);
        assert_eq!(scores[&recent[0]], 30.0);
        assert!((scores[&recent[1]] - 27.0).abs() < 1e-9);
        assert!((scores[&recent[2]] - 24.0).abs() < 1e-9);
        assert_eq!(scores[&recent[7]], 15.0);
    }

    #[test]
    fn test_recent_views_skip_origin_and_duplicates() {
        let w = ScoringWeights::default();
        let v = ids(3);
        let (origin, x, y) = (v[0], v[1], v[2]);

        let scores = recent_views(origin, &[origin, x, x, y], &w);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&x], 30.0);
        assert!((scores[&y] - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_recency_linear_within_window() {
        let w = ScoringWeights::default();
        let now = Utc::now();
        let v = ids(3);
        let rows = [
            (v[0], now),
            (v[1], now - Duration::hours(84)),
            (v[2], now - Duration::days(8)),
        ];

        let scores = recency(&rows, now, &w);
        assert_eq!(scores[&v[0]], 10.0);
        assert!((scores[&v[1]] - 5.0).abs() < 1e-9);
        assert!(!scores.contains_key(&v[2]));
    }

    #[test]
    fn test_merged_sums_discovery_signals_only() {
        let id = Uuid::new_v4();
        let mut set = SignalSet::default();
        set.direct.insert(id, 50.0);
        set.tags.insert(id, 20.0);
        set.recency.insert(id, 10.0);
        set.recency.insert(Uuid::new_v4(), 10.0);

        let merged = set.merged();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[&id], 70.0);
    }
}
