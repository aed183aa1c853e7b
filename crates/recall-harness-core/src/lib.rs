//! # Recall Harness Core
//!
//! Pure retrieval logic for Recall Harness: section models, the embedding
//! provider trait, cosine similarity ranking, the merge/dedup/label
//! pipeline, and the time machine.
//!
//! This crate performs no filesystem or network I/O. The `recall-harness`
//! app crate loads persisted indexes, embeds queries, and calls into here.
//!
//! ```rust
//! use recall_harness_core::merge::merge_and_rank;
//! use recall_harness_core::models::Candidate;
//!
//! let c = Candidate {
//!     text: "Result X however result Y contradicts it.".into(),
//!     document: "A.pdf".into(),
//!     source_file: "A".into(),
//!     page_number: Some(1),
//!     excerpt: "Result X".into(),
//!     file_mtime: Some(100.0),
//!     score: Some(0.8),
//! };
//! let out = merge_and_rank(vec![c.clone()], vec![c], 5);
//! assert_eq!(out.recommendations.len(), 1);
//! assert_eq!(out.time_machine.len(), 1);
//! ```

pub mod embedding;
pub mod label;
pub mod merge;
pub mod models;
pub mod search;
pub mod text;
pub mod time_machine;
