//! Prompt builders, response formats and the canned drafts used when the
//! synthesizer is unavailable.

use serde_json::{json, Value as JsonValue};

use ponder_core::{Candidate, NoteRef, ThinkingCommand};

/// System prompt for a command.
pub fn system_prompt(command: ThinkingCommand) -> &'static str {
    match command {
        ThinkingCommand::Connect => {
            "You help a person see why notes in their knowledge base relate. \
             For each candidate note, explain in one sentence how it connects to the origin note. \
             Be concrete and refer to the ideas, not the titles."
        }
        ThinkingCommand::Contrast => {
            "You help a person think critically about their notes. \
             Pick the one candidate whose ideas most diverge from or challenge the origin note, \
             then write a short markdown draft with exactly these sections: \
             ## Divergence, ## Tension, ## Probing questions."
        }
        ThinkingCommand::Combine => {
            "You help a person synthesize new ideas from their notes. \
             Pick the one candidate that merges most productively with the origin note, \
             then write a short markdown draft with exactly these sections: \
             ## Shared ground, ## Merged concept drafts (two or three numbered drafts)."
        }
        ThinkingCommand::Bridge => {
            "You help a person connect distant ideas in their notes. \
             Pick the one candidate that is least obviously related to the origin note yet still \
             bridgeable, then write a short markdown draft with exactly these sections: \
             ## The gap, ## Bridging concepts (two or three suggestions)."
        }
    }
}

/// Shape of the JSON object the synthesizer must return.
pub fn response_format(command: ThinkingCommand) -> JsonValue {
    match command {
        ThinkingCommand::Connect => json!({
            "reasons": [{"note_id": "candidate uuid", "reason": "one sentence"}]
        }),
        _ => json!({
            "selected_note_id": "candidate uuid",
            "reason": "one sentence",
            "content": "markdown draft",
            "title": "short title for the new note"
        }),
    }
}

/// User prompt listing the origin and every candidate with an excerpt.
pub fn user_prompt(
    origin: &NoteRef,
    candidates: &[Candidate],
    notes: &[NoteRef],
    excerpt_length: usize,
) -> String {
    let mut prompt = format!(
        "Origin note\nTitle: {}\n{}\n\nCandidates:\n",
        origin.title,
        origin.excerpt(excerpt_length)
    );
    for candidate in candidates {
        let body = notes
            .iter()
            .find(|n| n.id == candidate.note_id)
            .map(|n| n.excerpt(excerpt_length))
            .unwrap_or_default();
        prompt.push_str(&format!(
            "\n- id: {}\n  title: {}\n  signals: {}\n  excerpt: {}\n",
            candidate.note_id, candidate.title, candidate.reason, body
        ));
    }
    prompt
}

/// Title suggested for a draft when the synthesizer gave none.
pub fn fallback_title(command: ThinkingCommand, origin_title: &str, other_title: &str) -> String {
    match command {
        ThinkingCommand::Connect => other_title.to_string(),
        ThinkingCommand::Contrast => format!("{} vs. {}", origin_title, other_title),
        ThinkingCommand::Combine => format!("{} + {}", origin_title, other_title),
        ThinkingCommand::Bridge => format!("From {} to {}", origin_title, other_title),
    }
}

/// Canned markdown draft with the command's section layout.
pub fn fallback_content(
    command: ThinkingCommand,
    origin_title: &str,
    other_title: &str,
    reason: &str,
) -> String {
    match command {
        ThinkingCommand::Connect => reason.to_string(),
        ThinkingCommand::Contrast => format!(
            "## Divergence\n\n\
             Where do \"{origin}\" and \"{other}\" reach different conclusions? ({reason})\n\n\
             ## Tension\n\n\
             What would have to be true for both notes to hold at once?\n\n\
             ## Probing questions\n\n\
             - Which assumption in \"{origin}\" does \"{other}\" challenge?\n\
             - What evidence would settle the disagreement?\n\
             - Which note would you revise first, and why?\n",
            origin = origin_title,
            other = other_title,
            reason = reason
        ),
        ThinkingCommand::Combine => format!(
            "## Shared ground\n\n\
             \"{origin}\" and \"{other}\" overlap: {reason}.\n\n\
             ## Merged concept drafts\n\n\
             1. A concept that applies the core idea of \"{other}\" to \"{origin}\".\n\
             2. A concept that treats both notes as parts of one larger pattern.\n",
            origin = origin_title,
            other = other_title,
            reason = reason
        ),
        ThinkingCommand::Bridge => format!(
            "## The gap\n\n\
             \"{origin}\" and \"{other}\" sit apart in your notes ({reason}).\n\n\
             ## Bridging concepts\n\n\
             - An idea both notes depend on without naming it.\n\
             - A question whose answer would need both notes.\n",
            origin = origin_title,
            other = other_title,
            reason = reason
        ),
    }
}
