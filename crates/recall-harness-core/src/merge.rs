//! Merge, deduplicate, label, and rank two candidate lists.
//!
//! # Pipeline
//!
//! 1. Normalize each candidate's text (whitespace collapsed) and replace a
//!    missing or non-finite score with [`label::fallback_score`](crate::label::fallback_score).
//! 2. Deduplicate on `(document, page_number, sha256(text))`; the first
//!    occurrence wins, even when a later duplicate has a different excerpt.
//! 3. Label each survivor with [`label::classify`](crate::label::classify).
//! 4. Sort once, stably: score desc, label score desc, then dedup order.
//! 5. Build the time machine over every surviving item, then truncate to
//!    `top_k`, assign ranks, and fill empty excerpts from the snippet.
//!
//! The merge never fails: empty inputs produce empty output.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::label::{classify, fallback_score};
use crate::models::{Candidate, MergedItem, Recommendations};
use crate::text::{content_hash, normalize_whitespace, snippet};
use crate::time_machine;

/// Number of sentences kept in each snippet unless configured otherwise.
pub const DEFAULT_SNIPPET_SENTENCES: usize = 3;

/// Tuning parameters for [`merge_with`].
#[derive(Debug, Clone)]
pub struct MergeParams {
    /// Maximum number of recommendations to return.
    pub top_k: usize,
    /// Sentences kept in each snippet.
    pub snippet_sentences: usize,
}

impl MergeParams {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            snippet_sentences: DEFAULT_SNIPPET_SENTENCES,
        }
    }
}

/// Merge results from the active corpus and the historical archive.
///
/// Shorthand for [`merge_with`] using three-sentence snippets.
pub fn merge_and_rank(
    current: Vec<Candidate>,
    historical: Vec<Candidate>,
    top_k: usize,
) -> Recommendations {
    merge_with(current, historical, &MergeParams::new(top_k))
}

/// Merge two candidate lists into ranked recommendations plus provenance.
pub fn merge_with(
    current: Vec<Candidate>,
    historical: Vec<Candidate>,
    params: &MergeParams,
) -> Recommendations {
    let unique = dedup(current.into_iter().chain(historical).map(normalize));
    if unique.is_empty() {
        return Recommendations::default();
    }

    let mut items: Vec<MergedItem> = unique
        .into_iter()
        .map(|(candidate, score)| into_item(candidate, score, params.snippet_sentences))
        .collect();

    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(
                b.label_score
                    .partial_cmp(&a.label_score)
                    .unwrap_or(Ordering::Equal),
            )
    });

    let time_machine = time_machine::build(&items);

    items.truncate(params.top_k);
    for (i, item) in items.iter_mut().enumerate() {
        item.rank = i + 1;
        if item.excerpt.is_empty() {
            item.excerpt = item.snippet.clone();
        }
    }

    Recommendations {
        recommendations: items,
        time_machine,
    }
}

fn normalize(mut candidate: Candidate) -> (Candidate, f64) {
    candidate.text = normalize_whitespace(&candidate.text);
    let score = candidate
        .score
        .filter(|s| s.is_finite())
        .unwrap_or_else(|| fallback_score(&candidate.text));
    (candidate, score)
}

fn dedup(candidates: impl Iterator<Item = (Candidate, f64)>) -> Vec<(Candidate, f64)> {
    let mut seen: HashSet<(String, Option<u32>, String)> = HashSet::new();
    candidates
        .filter(|(c, _)| seen.insert((c.document.clone(), c.page_number, content_hash(&c.text))))
        .collect()
}

fn into_item(candidate: Candidate, score: f64, snippet_sentences: usize) -> MergedItem {
    let label = classify(&candidate.text);
    MergedItem {
        rank: 0,
        snippet: snippet(&candidate.text, snippet_sentences),
        document: candidate.document,
        source_file: candidate.source_file,
        page_number: candidate.page_number,
        excerpt: candidate.excerpt,
        text: candidate.text,
        score,
        label,
        label_score: label.score(),
        file_mtime: candidate.file_mtime,
    }
}
