//! File-backed embedding index with an mtime-validated cache.
//!
//! Each directory holds one persisted index file per source document,
//! recognized by a filename suffix (default `_embeddings.json`). A file is
//! a JSON array of section records:
//!
//! ```json
//! [
//!   {
//!     "text": "Full section text…",
//!     "vector": [0.012, -0.034, …],
//!     "document": "Report 2021.pdf",
//!     "page_number": 4,
//!     "excerpt": "Full section text…",
//!     "file_mtime": 1700000000.0
//!   }
//! ]
//! ```
//!
//! # Caching
//!
//! [`EmbeddingIndex::load`] stats every index file and compares the newest
//! mtime with the one recorded when the directory was last loaded. While no
//! file is newer, the cached records are returned without reading any file.
//! Otherwise the whole directory is re-parsed and the cache entry replaced.
//! There is no incremental update.
//!
//! # Degradation
//!
//! Missing directories yield no records. Unreadable or malformed files and
//! records, including vectors with components that overflow `f32`, are
//! skipped with a warning. Only a failure to list the directory
//! itself is reported as an error.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use recall_harness_core::embedding::magnitude;
use recall_harness_core::models::{Candidate, SectionRecord};
use recall_harness_core::search::rank_records;

/// Errors surfaced by the embedding index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The directory exists but could not be listed.
    #[error("Failed to read index directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Records loaded from one directory, plus the newest index mtime seen.
#[derive(Debug)]
pub struct IndexCacheEntry {
    pub records: Arc<Vec<SectionRecord>>,
    pub max_mtime: Option<SystemTime>,
}

/// Per-directory cache of loaded records.
///
/// Two callers that detect staleness for the same directory at the same
/// time will both reload and both insert; the last insert wins. Both
/// derive their entry from the same files, so the race costs a duplicate
/// reload and nothing else.
#[derive(Debug, Default)]
pub struct IndexCache {
    entries: RwLock<HashMap<PathBuf, Arc<IndexCacheEntry>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dir: &Path) -> Option<Arc<IndexCacheEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dir)
            .cloned()
    }

    pub fn insert(&self, dir: PathBuf, entry: IndexCacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dir, Arc::new(entry));
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.get(dir).is_some()
    }
}

/// A persisted index file found during enumeration.
#[derive(Debug, Clone)]
struct IndexFile {
    path: PathBuf,
    /// File name with the index suffix stripped.
    source_file: String,
    mtime: SystemTime,
}

/// One enumeration of a directory plus the records it resolves to.
struct Snapshot {
    files: Vec<IndexFile>,
    records: Arc<Vec<SectionRecord>>,
}

/// Summary of one index directory, as reported by `rcl stats`.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryStats {
    pub path: PathBuf,
    pub exists: bool,
    pub index_files: usize,
    pub records: usize,
    /// Distinct vector lengths across all records.
    pub dimensions: BTreeSet<usize>,
    pub newest_index: Option<DateTime<Utc>>,
}

/// Loads and searches persisted embedding indexes.
pub struct EmbeddingIndex {
    suffix: String,
    cache: IndexCache,
}

impl EmbeddingIndex {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            cache: IndexCache::new(),
        }
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Return every usable record in `dir`, reloading when any index file
    /// is newer than the cached snapshot.
    pub fn load(&self, dir: &Path) -> Result<Arc<Vec<SectionRecord>>, IndexError> {
        Ok(self
            .snapshot(dir)?
            .map(|snapshot| snapshot.records)
            .unwrap_or_default())
    }

    /// Enumerate `dir` once and return its files alongside the records,
    /// served from the cache when nothing is newer. `None` when the
    /// directory does not exist.
    fn snapshot(&self, dir: &Path) -> Result<Option<Snapshot>, IndexError> {
        match fs::metadata(dir) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "Index directory absent");
                return Ok(None);
            }
            Err(source) => {
                return Err(IndexError::ReadDir {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        }

        let files = match self.index_files(dir) {
            Ok(files) => files,
            Err(IndexError::ReadDir { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let current_max = files.iter().map(|f| f.mtime).max();

        if let Some(entry) = self.cache.get(dir) {
            if entry.max_mtime >= current_max {
                debug!(dir = %dir.display(), records = entry.records.len(), "Index cache hit");
                return Ok(Some(Snapshot {
                    records: entry.records.clone(),
                    files,
                }));
            }
        }

        let records = Arc::new(read_records(&files));
        info!(
            dir = %dir.display(),
            files = files.len(),
            records = records.len(),
            "Loaded embedding index"
        );
        self.cache.insert(
            dir.to_path_buf(),
            IndexCacheEntry {
                records: records.clone(),
                max_mtime: current_max,
            },
        );
        Ok(Some(Snapshot { files, records }))
    }

    /// Rank the records in `dir` by cosine similarity to `query`.
    ///
    /// Returns at most `top_k` candidates, best first. An empty or
    /// zero-magnitude query returns nothing without touching the directory.
    pub fn search(
        &self,
        query: &[f32],
        dir: &Path,
        top_k: usize,
    ) -> Result<Vec<Candidate>, IndexError> {
        if query.is_empty() || magnitude(query) < f64::EPSILON {
            debug!(dir = %dir.display(), "Empty or zero-magnitude query vector");
            return Ok(Vec::new());
        }

        let records = self.load(dir)?;
        let ranked = rank_records(query, &records, top_k);
        if ranked.dimension_mismatches > 0 {
            warn!(
                dir = %dir.display(),
                skipped = ranked.dimension_mismatches,
                query_dims = query.len(),
                "Skipped records with a different vector dimension"
            );
        }
        Ok(ranked.candidates)
    }

    /// Summarize `dir` for diagnostics. Goes through the cache.
    pub fn stats(&self, dir: &Path) -> Result<DirectoryStats, IndexError> {
        let Some(snapshot) = self.snapshot(dir)? else {
            return Ok(DirectoryStats {
                path: dir.to_path_buf(),
                exists: false,
                index_files: 0,
                records: 0,
                dimensions: BTreeSet::new(),
                newest_index: None,
            });
        };

        Ok(DirectoryStats {
            path: dir.to_path_buf(),
            exists: true,
            index_files: snapshot.files.len(),
            records: snapshot.records.len(),
            dimensions: snapshot.records.iter().map(|r| r.vector.len()).collect(),
            newest_index: snapshot
                .files
                .iter()
                .map(|f| f.mtime)
                .max()
                .map(DateTime::<Utc>::from),
        })
    }

    fn index_files(&self, dir: &Path) -> Result<Vec<IndexFile>, IndexError> {
        let read_dir = fs::read_dir(dir).map_err(|source| IndexError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(stem) = name.strip_suffix(self.suffix.as_str()) else {
                continue;
            };

            let path = entry.path();
            let mtime = match fs::metadata(&path).and_then(|m| {
                if m.is_file() {
                    m.modified()
                } else {
                    Err(io::Error::other("not a regular file"))
                }
            }) {
                Ok(mtime) => mtime,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping index file");
                    continue;
                }
            };

            files.push(IndexFile {
                path,
                source_file: stem.to_string(),
                mtime,
            });
        }

        // Sort for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

fn read_records(files: &[IndexFile]) -> Vec<SectionRecord> {
    let mut all = Vec::new();
    for file in files {
        match read_index_file(file) {
            Ok(records) => all.extend(records),
            Err(e) => warn!(path = %file.path.display(), error = %e, "Skipping malformed index file"),
        }
    }
    all
}

fn read_index_file(file: &IndexFile) -> anyhow::Result<Vec<SectionRecord>> {
    let content = fs::read_to_string(&file.path)?;
    let raw: Vec<serde_json::Value> = serde_json::from_str(&content)?;
    let file_mtime = unix_seconds(file.mtime);

    let mut records = Vec::with_capacity(raw.len());
    let mut empty_vectors = 0usize;
    let mut non_finite = 0usize;
    for (i, value) in raw.into_iter().enumerate() {
        let mut record: SectionRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %file.path.display(), record = i, error = %e, "Skipping malformed record");
                continue;
            }
        };
        if record.vector.is_empty() {
            empty_vectors += 1;
            continue;
        }
        if record.vector.iter().any(|x| !x.is_finite()) {
            non_finite += 1;
            continue;
        }
        record.source_file = file.source_file.clone();
        if record.document.is_empty() {
            record.document = file.source_file.clone();
        }
        if record.file_mtime.is_none() {
            record.file_mtime = file_mtime;
        }
        records.push(record);
    }

    if empty_vectors > 0 {
        warn!(path = %file.path.display(), skipped = empty_vectors, "Skipped records without vectors");
    }
    if non_finite > 0 {
        warn!(path = %file.path.display(), skipped = non_finite, "Skipped records with non-finite vector components");
    }
    Ok(records)
}

fn unix_seconds(t: SystemTime) -> Option<f64> {
    t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs_f64())
}
