//! Brute-force cosine similarity ranking over cached section records.
//!
//! The calling application owns loading and caching records; this module
//! only scores a slice of them against a query vector. Every call is a full
//! linear scan, there is no persistent index structure.
//!
//! # Ordering
//!
//! Results are sorted by score descending with a stable sort, so records
//! with equal scores keep their position in the input slice. No other
//! secondary key (document name, page) is consulted.

use std::cmp::Ordering;

use crate::embedding::{cosine_with_norm, magnitude};
use crate::models::{Candidate, SectionRecord};

/// Output of [`rank_records`].
#[derive(Debug, Clone, Default)]
pub struct RankedCandidates {
    /// At most `top_k` candidates, best first, without vectors.
    pub candidates: Vec<Candidate>,
    /// Records skipped because their vector length differs from the query's.
    pub dimension_mismatches: usize,
}

/// Score every record against `query` and keep the best `top_k`.
///
/// An empty or zero-magnitude query yields no candidates. Records whose
/// dimension differs from the query are left out of scoring and counted in
/// [`RankedCandidates::dimension_mismatches`]. A zero-magnitude record, or
/// one whose score is not finite, scores `0.0`.
pub fn rank_records(query: &[f32], records: &[SectionRecord], top_k: usize) -> RankedCandidates {
    let query_norm = magnitude(query);
    if query.is_empty() || query_norm < f64::EPSILON || top_k == 0 {
        return RankedCandidates::default();
    }

    let mut dimension_mismatches = 0;
    let mut scored: Vec<(&SectionRecord, f64)> = Vec::with_capacity(records.len());

    for record in records {
        if record.vector.len() != query.len() {
            dimension_mismatches += 1;
            continue;
        }
        scored.push((record, cosine_with_norm(query, query_norm, &record.vector)));
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);

    RankedCandidates {
        candidates: scored
            .into_iter()
            .map(|(record, score)| Candidate::from_record(record, score))
            .collect(),
        dimension_mismatches,
    }
}
