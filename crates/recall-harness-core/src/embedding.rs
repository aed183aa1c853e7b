//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, plus pure helper functions for similarity computation.
//!
//! Concrete provider implementations (OpenAI, Ollama) live in the
//! `recall-harness` app crate.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding providers.
///
/// A provider turns a text into a fixed-length vector. For a given
/// configuration the output dimension is constant and identical input
/// yields identical output.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a single non-empty text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embed a query text, short-circuiting blank input.
///
/// Blank text maps to an all-zero vector of the provider's dimension
/// without calling the backend. Similarity search treats a zero vector as
/// an invalid query and returns nothing.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(vec![0.0; provider.dims()]);
    }
    provider.embed(text).await
}

/// Euclidean norm of a vector, accumulated in `f64`.
pub fn magnitude(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or when
/// either vector has zero magnitude.
///
/// # Formula
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    cosine_with_norm(a, magnitude(a), b)
}

/// Cosine similarity with the query norm precomputed.
///
/// Ranking scores many records against one query, so the query's
/// magnitude is computed once by the caller. Vectors must have equal
/// length. A zero-magnitude side or a non-finite result scores `0.0`, so
/// the output always lies in `[-1.0, 1.0]`.
pub fn cosine_with_norm(query: &[f32], query_norm: f64, v: &[f32]) -> f64 {
    let norm = magnitude(v);
    if query_norm < f64::EPSILON || norm < f64::EPSILON {
        return 0.0;
    }
    let dot: f64 = query
        .iter()
        .zip(v.iter())
        .map(|(a, b)| f64::from(*a) * f64::from(*b))
        .sum();
    let sim = dot / (query_norm * norm);
    if !sim.is_finite() {
        return 0.0;
    }
    sim.clamp(-1.0, 1.0)
}
