//! Retrieval orchestration: embed the selection, search both scopes,
//! merge, and build the time machine.
//!
//! Index loads read and parse files synchronously, so each scope search
//! runs on tokio's blocking pool.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use recall_harness_core::embedding::{embed_query, EmbeddingProvider};
use recall_harness_core::merge::{merge_with, MergeParams};
use recall_harness_core::models::{Candidate, MergedItem, TimeMachineEntry};

use crate::config::Config;
use crate::index::EmbeddingIndex;

/// Which configured index directory to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The user's active documents.
    Documents,
    /// The historical archive.
    Historical,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Documents => "documents",
            Scope::Historical => "historical",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of [`RetrievalService::recommend`].
#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    /// Always `"offline"`: results come only from local indexes.
    pub source: &'static str,
    pub query: String,
    pub recommendations: Vec<MergedItem>,
    pub time_machine: Vec<TimeMachineEntry>,
}

pub struct RetrievalService {
    config: Config,
    provider: Box<dyn EmbeddingProvider>,
    index: Arc<EmbeddingIndex>,
}

impl RetrievalService {
    pub fn new(config: Config, provider: Box<dyn EmbeddingProvider>) -> Self {
        let index = Arc::new(EmbeddingIndex::new(config.storage.index_suffix.clone()));
        Self {
            config,
            provider,
            index,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn scope_dir(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Documents => &self.config.storage.documents_dir,
            Scope::Historical => &self.config.storage.historical_dir,
        }
    }

    /// Semantic search over a single scope.
    pub async fn search_scope(
        &self,
        text: &str,
        scope: Scope,
        limit: Option<usize>,
    ) -> Result<Vec<Candidate>> {
        let limit = limit.unwrap_or(self.config.retrieval.candidates_per_dir);
        let query = embed_query(self.provider.as_ref(), text)
            .await
            .context("Failed to embed query")?;
        self.search_with_vector(&query, scope, limit).await
    }

    /// Related passages from both scopes, merged and ranked.
    pub async fn recommend(&self, text: &str, top_k: Option<usize>) -> Result<RecommendResponse> {
        let top_k = top_k.unwrap_or(self.config.retrieval.top_k);
        let per_dir = self.config.retrieval.candidates_per_dir;

        let query = embed_query(self.provider.as_ref(), text)
            .await
            .context("Failed to embed query")?;

        let (current, historical) = tokio::try_join!(
            self.search_with_vector(&query, Scope::Documents, per_dir),
            self.search_with_vector(&query, Scope::Historical, per_dir),
        )?;
        debug!(
            current = current.len(),
            historical = historical.len(),
            "Collected candidates"
        );

        let params = MergeParams {
            top_k,
            snippet_sentences: self.config.retrieval.snippet_sentences,
        };
        let merged = merge_with(current, historical, &params);
        info!(
            recommendations = merged.recommendations.len(),
            ideas = merged.time_machine.len(),
            "Recommendation complete"
        );

        Ok(RecommendResponse {
            source: "offline",
            query: text.to_string(),
            recommendations: merged.recommendations,
            time_machine: merged.time_machine,
        })
    }

    async fn search_with_vector(
        &self,
        query: &[f32],
        scope: Scope,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let index = Arc::clone(&self.index);
        let dir = self.scope_dir(scope).to_path_buf();
        let query = query.to_vec();

        tokio::task::spawn_blocking(move || index.search(&query, &dir, limit))
            .await?
            .with_context(|| format!("Search failed for {} scope", scope))
    }
}
