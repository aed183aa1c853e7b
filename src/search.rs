//! `rcl search`: semantic search over a single scope.

use anyhow::Result;

use recall_harness_core::models::Candidate;

use crate::service::{RetrievalService, Scope};

/// Run a single-scope search and print the ranked candidates.
pub async fn run_search(
    service: &RetrievalService,
    text: &str,
    scope: Scope,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let results = service.search_scope(text, scope, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        print_candidate(i + 1, result);
    }
    Ok(())
}

fn print_candidate(rank: usize, c: &Candidate) {
    println!(
        "{}. [{:.2}] {}{}",
        rank,
        c.score.unwrap_or(0.0),
        c.document,
        c.page_number
            .map(|p| format!(" (p. {})", p))
            .unwrap_or_default()
    );
    println!("    source: {}", c.source_file);
    let excerpt = if c.excerpt.trim().is_empty() {
        &c.text
    } else {
        &c.excerpt
    };
    println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
    println!();
}
