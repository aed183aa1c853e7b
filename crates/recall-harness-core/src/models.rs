//! Core data models used throughout Recall Harness.
//!
//! These types describe the section records read from persisted embedding
//! indexes and the candidates, merged items, and provenance entries that
//! flow through a single retrieval request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One retrievable text unit with its precomputed embedding.
///
/// Records are written by the upstream ingestion stage, one JSON object per
/// section, and are only ever read here. `source_file` is not part of the
/// persisted object: the index loader derives it from the index file name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectionRecord {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub vector: Vec<f32>,
    #[serde(default)]
    pub document: String,
    #[serde(default, skip_deserializing)]
    pub source_file: String,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub excerpt: String,
    /// Modification time of the originating artifact, in Unix seconds.
    #[serde(default)]
    pub file_mtime: Option<f64>,
}

/// A section returned from similarity search, without its vector.
///
/// `score` is always set by similarity search. Candidates assembled from
/// other sources may leave it empty; the merge stage then assigns a
/// fallback score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub document: String,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub file_mtime: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl Candidate {
    /// Copy a record's display fields into a scored candidate.
    pub fn from_record(record: &SectionRecord, score: f64) -> Self {
        Self {
            text: record.text.clone(),
            document: record.document.clone(),
            source_file: record.source_file.clone(),
            page_number: record.page_number,
            excerpt: record.excerpt.clone(),
            file_mtime: record.file_mtime,
            score: Some(score),
        }
    }
}

/// Heuristic relation between a retrieved section and the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationLabel {
    Contradiction,
    Example,
    Supporting,
    Related,
}

impl RelationLabel {
    /// Fixed secondary ranking weight for each label.
    pub fn score(self) -> f64 {
        match self {
            RelationLabel::Contradiction => 0.9,
            RelationLabel::Example => 0.7,
            RelationLabel::Supporting => 0.5,
            RelationLabel::Related => 0.3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationLabel::Contradiction => "contradiction",
            RelationLabel::Example => "example",
            RelationLabel::Supporting => "supporting",
            RelationLabel::Related => "related",
        }
    }
}

impl std::fmt::Display for RelationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deduplicated, labeled, ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedItem {
    /// 1-based position in the final ordering.
    pub rank: usize,
    pub document: String,
    pub source_file: String,
    pub page_number: Option<u32>,
    pub excerpt: String,
    /// First few sentences of `text`.
    pub snippet: String,
    /// Whitespace-normalized section text.
    pub text: String,
    pub score: f64,
    pub label: RelationLabel,
    pub label_score: f64,
    pub file_mtime: Option<f64>,
}

/// The most recent contradicting occurrence of an idea.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contradiction {
    pub document: String,
    pub when: DateTime<Utc>,
}

/// Provenance of one idea across the retrieved sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeMachineEntry {
    /// Lowercased, trimmed excerpt prefix identifying the idea.
    pub idea_key: String,
    pub first_seen: DateTime<Utc>,
    pub first_doc: String,
    pub latest_contradiction: Option<Contradiction>,
}

/// Output of the merge stage: ranked recommendations plus provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub recommendations: Vec<MergedItem>,
    pub time_machine: Vec<TimeMachineEntry>,
}
