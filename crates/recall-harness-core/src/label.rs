//! Relation labeling and fallback scoring policy.
//!
//! Both rules are deliberately simple heuristics. Keyword matching is plain
//! substring containment over the lowercased text, checked in priority
//! order: contradiction cues first, then example cues, then a length rule.

use crate::models::RelationLabel;
use crate::text::word_count;

/// Cues that mark a section as contradicting or qualifying a claim.
pub const CONTRADICTION_CUES: &[&str] = &[
    "however",
    "but",
    "contradict",
    "contrary",
    "not consistent",
    "disagree",
    "fail",
    "limitations",
];

/// Cues that mark a section as a worked example or evidence.
pub const EXAMPLE_CUES: &[&str] = &[
    "for example",
    "e.g.",
    "case",
    "experiment",
    "we evaluated",
    "study shows",
    "dataset",
];

/// Sections with more words than this are `supporting` rather than `related`.
pub const SUPPORTING_MIN_WORDS: usize = 12;

/// Classify a section's text into a [`RelationLabel`].
pub fn classify(text: &str) -> RelationLabel {
    let lower = text.to_lowercase();
    if CONTRADICTION_CUES.iter().any(|cue| lower.contains(cue)) {
        RelationLabel::Contradiction
    } else if EXAMPLE_CUES.iter().any(|cue| lower.contains(cue)) {
        RelationLabel::Example
    } else if word_count(&lower) > SUPPORTING_MIN_WORDS {
        RelationLabel::Supporting
    } else {
        RelationLabel::Related
    }
}

/// Score assigned to a candidate that arrives without one.
///
/// `min(1.0, 0.01 × max(10, words))`: short texts get `0.1`, and the score
/// grows with length until it saturates at 100 words.
pub fn fallback_score(text: &str) -> f64 {
    let words = word_count(text).max(10) as f64;
    (0.01 * words).min(1.0)
}
