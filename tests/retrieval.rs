//! End-to-end retrieval tests: real index files on disk, a fixed
//! in-process embedding provider, and the full `RetrievalService` path.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use recall_harness::config::parse_config;
use recall_harness::index::EmbeddingIndex;
use recall_harness::service::{RetrievalService, Scope};
use recall_harness_core::embedding::EmbeddingProvider;
use recall_harness_core::models::RelationLabel;

const SUFFIX: &str = "_embeddings.json";

/// Returns the same vector for every input and counts calls.
struct FixedProvider {
    vector: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl FixedProvider {
    fn new(vector: Vec<f32>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                vector,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl EmbeddingProvider for FixedProvider {
    fn model_name(&self) -> &str {
        "fixed"
    }
    fn dims(&self) -> usize {
        self.vector.len()
    }
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }
}

fn write_index(dir: &Path, stem: &str, records: serde_json::Value, mtime_secs: u64) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(format!("{}{}", stem, SUFFIX));
    fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
    set_mtime(&path, mtime_secs);
    path
}

fn set_mtime(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

fn setup_service(root: &Path, vector: Vec<f32>) -> (RetrievalService, Arc<AtomicUsize>) {
    let content = format!(
        r#"[storage]
documents_dir = "{}/documents"
historical_dir = "{}/historical"

[retrieval]
top_k = 6
"#,
        root.display(),
        root.display()
    );
    let cfg = parse_config(&content).unwrap();
    let (provider, calls) = FixedProvider::new(vector);
    (RetrievalService::new(cfg, Box::new(provider)), calls)
}

// ============ Index cache ============

#[test]
fn test_load_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    write_index(
        tmp.path(),
        "paper",
        json!([
            {"text": "one", "vector": [1.0, 0.0], "document": "paper.pdf", "page_number": 1},
            {"text": "two", "vector": [0.0, 1.0], "document": "paper.pdf", "page_number": 2}
        ]),
        1_000,
    );

    let index = EmbeddingIndex::new(SUFFIX);
    let first = index.load(tmp.path()).unwrap();
    let second = index.load(tmp.path()).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_load_reloads_after_mtime_increase() {
    let tmp = TempDir::new().unwrap();
    let path = write_index(
        tmp.path(),
        "paper",
        json!([{"text": "old", "vector": [1.0, 0.0]}]),
        1_000,
    );

    let index = EmbeddingIndex::new(SUFFIX);
    assert_eq!(index.load(tmp.path()).unwrap()[0].text, "old");

    fs::write(
        &path,
        json!([{"text": "new", "vector": [1.0, 0.0]}, {"text": "newer", "vector": [0.0, 1.0]}])
            .to_string(),
    )
    .unwrap();
    set_mtime(&path, 2_000);

    let reloaded = index.load(tmp.path()).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[0].text, "new");
}

#[test]
fn test_new_file_triggers_reload() {
    let tmp = TempDir::new().unwrap();
    write_index(tmp.path(), "a", json!([{"text": "a", "vector": [1.0]}]), 1_000);

    let index = EmbeddingIndex::new(SUFFIX);
    assert_eq!(index.load(tmp.path()).unwrap().len(), 1);

    write_index(tmp.path(), "b", json!([{"text": "b", "vector": [1.0]}]), 5_000);
    assert_eq!(index.load(tmp.path()).unwrap().len(), 2);
}

#[test]
fn test_malformed_file_does_not_break_load() {
    let tmp = TempDir::new().unwrap();
    write_index(tmp.path(), "good", json!([{"text": "ok", "vector": [1.0, 0.0]}]), 1_000);
    let bad = tmp.path().join(format!("bad{}", SUFFIX));
    fs::write(&bad, "{ not json").unwrap();

    let index = EmbeddingIndex::new(SUFFIX);
    let records = index.load(tmp.path()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_file, "good");
}

#[test]
fn test_malformed_and_empty_vector_records_skipped() {
    let tmp = TempDir::new().unwrap();
    write_index(
        tmp.path(),
        "mixed",
        json!([
            {"text": "kept", "vector": [1.0, 0.0], "file_mtime": 42.0},
            {"text": "no vector", "vector": []},
            {"text": 5, "vector": [1.0, 0.0]},
            {"text": "bad page", "vector": [1.0, 0.0], "page_number": "four"}
        ]),
        1_000,
    );

    let index = EmbeddingIndex::new(SUFFIX);
    let records = index.load(tmp.path()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "kept");
    assert_eq!(records[0].file_mtime, Some(42.0));
}

#[test]
fn test_missing_directory_creates_no_cache_entry() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing");
    let index = EmbeddingIndex::new(SUFFIX);

    assert!(index.load(&missing).unwrap().is_empty());
    assert!(index.search(&[1.0, 0.0], &missing, 5).unwrap().is_empty());
    assert!(!index.cache().contains(&missing));
}

// ============ Similarity search ============

#[test]
fn test_search_ranks_by_cosine() {
    let tmp = TempDir::new().unwrap();
    write_index(
        tmp.path(),
        "paper",
        json!([
            {"text": "orthogonal", "vector": [0.0, 1.0]},
            {"text": "identical", "vector": [2.0, 0.0]},
            {"text": "diagonal", "vector": [1.0, 1.0]}
        ]),
        1_000,
    );

    let index = EmbeddingIndex::new(SUFFIX);
    let results = index.search(&[1.0, 0.0], tmp.path(), 5).unwrap();
    let texts: Vec<&str> = results.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["identical", "diagonal", "orthogonal"]);
    assert!((results[0].score.unwrap() - 1.0).abs() < 1e-9);

    let top1 = index.search(&[1.0, 0.0], tmp.path(), 1).unwrap();
    assert_eq!(top1.len(), 1);
}

#[test]
fn test_search_zero_query_is_empty() {
    let tmp = TempDir::new().unwrap();
    write_index(tmp.path(), "paper", json!([{"text": "x", "vector": [1.0, 0.0]}]), 1_000);

    let index = EmbeddingIndex::new(SUFFIX);
    assert!(index.search(&[0.0, 0.0], tmp.path(), 5).unwrap().is_empty());
    assert!(index.search(&[], tmp.path(), 5).unwrap().is_empty());
}

#[test]
fn test_search_skips_dimension_mismatch() {
    let tmp = TempDir::new().unwrap();
    write_index(
        tmp.path(),
        "paper",
        json!([
            {"text": "three dims", "vector": [1.0, 0.0, 0.0]},
            {"text": "two dims", "vector": [1.0, 0.0]}
        ]),
        1_000,
    );

    let index = EmbeddingIndex::new(SUFFIX);
    let results = index.search(&[1.0, 0.0], tmp.path(), 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "two dims");
}

// ============ Retrieval service ============

#[tokio::test]
async fn test_recommend_dedups_across_scopes() {
    let tmp = TempDir::new().unwrap();
    let record = |mtime: f64| {
        json!([{
            "text": "Result X however result Y contradicts it.",
            "vector": [1.0, 0.0],
            "document": "A.pdf",
            "page_number": 1,
            "excerpt": "Result X however result Y contradicts it.",
            "file_mtime": mtime
        }])
    };
    write_index(&tmp.path().join("documents"), "A", record(100.0), 1_000);
    write_index(&tmp.path().join("historical"), "A", record(200.0), 1_000);

    let (service, _) = setup_service(tmp.path(), vec![1.0, 0.0]);
    let response = service.recommend("result x", None).await.unwrap();

    assert_eq!(response.source, "offline");
    assert_eq!(response.recommendations.len(), 1);
    let item = &response.recommendations[0];
    assert_eq!(item.rank, 1);
    assert_eq!(item.label, RelationLabel::Contradiction);
    assert_eq!(response.time_machine.len(), 1);
    assert_eq!(response.time_machine[0].first_seen.timestamp(), 100);
    assert_eq!(response.time_machine[0].first_doc, "A.pdf");
}

#[tokio::test]
async fn test_recommend_top_k() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("documents");
    write_index(
        &docs,
        "paper",
        json!([
            {"text": "first distinct section", "vector": [1.0, 0.0], "page_number": 1},
            {"text": "second distinct section", "vector": [1.0, 0.2], "page_number": 2},
            {"text": "third distinct section", "vector": [1.0, 0.5], "page_number": 3},
            {"text": "fourth distinct section", "vector": [1.0, 1.0], "page_number": 4},
            {"text": "fifth distinct section", "vector": [0.2, 1.0], "page_number": 5}
        ]),
        1_000,
    );

    let (service, _) = setup_service(tmp.path(), vec![1.0, 0.0]);
    let response = service.recommend("section", Some(2)).await.unwrap();

    assert_eq!(response.recommendations.len(), 2);
    assert_eq!(response.recommendations[0].rank, 1);
    assert_eq!(response.recommendations[1].rank, 2);
    assert_eq!(response.recommendations[0].text, "first distinct section");
    assert!(response.recommendations[0].score > response.recommendations[1].score);
}

#[tokio::test]
async fn test_blank_selection_skips_provider() {
    let tmp = TempDir::new().unwrap();
    write_index(
        &tmp.path().join("documents"),
        "paper",
        json!([{"text": "x", "vector": [1.0, 0.0]}]),
        1_000,
    );

    let (service, calls) = setup_service(tmp.path(), vec![1.0, 0.0]);
    let response = service.recommend("   \n", None).await.unwrap();

    assert!(response.recommendations.is_empty());
    assert!(response.time_machine.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_scope_uses_requested_directory() {
    let tmp = TempDir::new().unwrap();
    write_index(
        &tmp.path().join("documents"),
        "current",
        json!([{"text": "from documents", "vector": [1.0, 0.0]}]),
        1_000,
    );
    write_index(
        &tmp.path().join("historical"),
        "archive",
        json!([{"text": "from archive", "vector": [1.0, 0.0]}]),
        1_000,
    );

    let (service, calls) = setup_service(tmp.path(), vec![1.0, 0.0]);
    let hist = service
        .search_scope("anything", Scope::Historical, None)
        .await
        .unwrap();
    assert_eq!(hist.len(), 1);
    assert_eq!(hist[0].text, "from archive");
    assert_eq!(hist[0].source_file, "archive");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_recommend_with_no_indexes() {
    let tmp = TempDir::new().unwrap();
    let (service, _) = setup_service(tmp.path(), vec![1.0, 0.0]);
    let response = service.recommend("anything", None).await.unwrap();
    assert!(response.recommendations.is_empty());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["source"], "offline");
    assert_eq!(json["recommendations"], json!([]));
}

#[tokio::test]
async fn test_unreadable_scope_is_reported() {
    let tmp = TempDir::new().unwrap();
    // A regular file where the documents directory's parent should be
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let (service, _) = setup_service(&blocker, vec![1.0, 0.0]);
    let err = service.recommend("anything", None).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("scope"), "unexpected error: {}", message);
    assert!(
        message.contains("Failed to read index directory"),
        "unexpected error: {}",
        message
    );
}

#[tokio::test]
async fn test_overflowing_vectors_do_not_outrank_matches() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("documents");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join(format!("paper{}", SUFFIX)),
        r#"[
  {"text": "orthogonal passage", "vector": [0.0, 1.0], "page_number": 1},
  {"text": "overflowing passage", "vector": [1e39, 0.0], "page_number": 2},
  {"text": "matching passage", "vector": [1.0, 0.0], "page_number": 3}
]"#,
    )
    .unwrap();

    let (service, _) = setup_service(tmp.path(), vec![1.0, 0.0]);
    let response = service.recommend("passage", None).await.unwrap();
    let texts: Vec<&str> = response
        .recommendations
        .iter()
        .map(|i| i.text.as_str())
        .collect();
    assert_eq!(texts, vec!["matching passage", "orthogonal passage"]);
    assert!(response
        .recommendations
        .iter()
        .all(|i| (-1.0..=1.0).contains(&i.score)));
}
