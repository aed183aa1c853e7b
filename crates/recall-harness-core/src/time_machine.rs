//! Temporal provenance ("time machine") over merged results.
//!
//! Items are grouped into approximate *ideas* by a literal prefix of their
//! excerpt: the first 100 characters, trimmed and lowercased. Two passages
//! about the same concept with different leading wording are different
//! ideas. For each idea the builder reports the earliest known occurrence
//! and the most recent contradicting occurrence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{Contradiction, MergedItem, RelationLabel, TimeMachineEntry};

/// Number of excerpt characters that identify an idea.
pub const IDEA_KEY_CHARS: usize = 100;

/// Derive the idea key for an excerpt. Returns an empty string for blank
/// excerpts.
pub fn idea_key(excerpt: &str) -> String {
    let prefix: String = excerpt.chars().take(IDEA_KEY_CHARS).collect();
    prefix.trim().to_lowercase()
}

/// Convert a Unix timestamp in (fractional) seconds to a UTC datetime.
///
/// Returns `None` for non-finite or out-of-range values.
pub fn mtime_to_datetime(mtime: f64) -> Option<DateTime<Utc>> {
    if !mtime.is_finite() {
        return None;
    }
    let secs = mtime.floor();
    let nanos = (((mtime - secs) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(secs as i64, nanos)
}

#[derive(Default)]
struct IdeaGroup<'a> {
    first: Option<(f64, &'a str)>,
    latest_contradiction: Option<(f64, &'a str)>,
}

/// Build provenance entries for every idea with at least one known
/// timestamp, oldest first.
///
/// Members without a usable `file_mtime` never set `first_seen`. Groups in
/// which no member has one are left out entirely. Ties on `first_seen` keep
/// the order in which the groups first appeared in `items`.
pub fn build(items: &[MergedItem]) -> Vec<TimeMachineEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, IdeaGroup<'_>> = HashMap::new();

    for item in items {
        let key = idea_key(&item.excerpt);
        if key.is_empty() {
            continue;
        }
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            IdeaGroup::default()
        });

        let Some(mtime) = item.file_mtime.filter(|t| mtime_to_datetime(*t).is_some()) else {
            continue;
        };

        if group.first.map_or(true, |(seen, _)| mtime < seen) {
            group.first = Some((mtime, item.document.as_str()));
        }
        if item.label == RelationLabel::Contradiction
            && group
                .latest_contradiction
                .map_or(true, |(when, _)| mtime >= when)
        {
            group.latest_contradiction = Some((mtime, item.document.as_str()));
        }
    }

    let mut entries: Vec<(f64, TimeMachineEntry)> = order
        .into_iter()
        .filter_map(|key| {
            let group = groups.remove(&key)?;
            let (first_mtime, first_doc) = group.first?;
            let first_seen = mtime_to_datetime(first_mtime)?;
            let latest_contradiction = group.latest_contradiction.and_then(|(when, doc)| {
                mtime_to_datetime(when).map(|when| Contradiction {
                    document: doc.to_string(),
                    when,
                })
            });
            Some((
                first_mtime,
                TimeMachineEntry {
                    idea_key: key,
                    first_seen,
                    first_doc: first_doc.to_string(),
                    latest_contradiction,
                },
            ))
        })
        .collect();

    entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    entries.into_iter().map(|(_, entry)| entry).collect()
}
