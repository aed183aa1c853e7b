//! Index statistics and health overview.
//!
//! Provides a quick summary of what each scope holds: index file counts,
//! record counts, vector dimensions, and the newest index timestamp. Used
//! by `rcl stats` to confirm the indexing pipeline produced what retrieval
//! expects. Mixed dimensions within a scope are flagged, since records that
//! don't match the query dimension are skipped at search time.

use anyhow::Result;

use crate::index::DirectoryStats;
use crate::service::{RetrievalService, Scope};

/// Run the stats command: inspect both scopes and print a summary.
pub fn run_stats(service: &RetrievalService) -> Result<()> {
    let config = service.config();

    println!("Recall Harness: Index Stats");
    println!("===========================");
    println!();
    println!("  Index suffix: {}", config.storage.index_suffix);
    println!(
        "  Embedding:    {} {}",
        config.embedding.provider,
        match (&config.embedding.model, config.embedding.dims) {
            (Some(model), Some(dims)) => format!("({}, {} dims)", model, dims),
            _ => String::new(),
        }
    );

    for scope in [Scope::Documents, Scope::Historical] {
        let stats = service.index().stats(service.scope_dir(scope))?;
        println!();
        print_scope(scope, &stats, config.embedding.dims);
    }

    Ok(())
}

fn print_scope(scope: Scope, stats: &DirectoryStats, expected_dims: Option<usize>) {
    println!("  [{}]", scope);
    println!("    Directory:  {}", stats.path.display());
    if !stats.exists {
        println!("    (missing)");
        return;
    }
    println!("    Files:      {}", stats.index_files);
    println!("    Records:    {}", stats.records);
    println!("    Dimensions: {}", format_dims(stats, expected_dims));
    println!(
        "    Newest:     {}",
        stats
            .newest_index
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string())
    );
}

fn format_dims(stats: &DirectoryStats, expected: Option<usize>) -> String {
    if stats.dimensions.is_empty() {
        return "-".to_string();
    }
    let list = stats
        .dimensions
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = list;
    if stats.dimensions.len() > 1 {
        out.push_str("  (mixed)");
    }
    if let Some(expected) = expected {
        if !stats.dimensions.contains(&expected) {
            out.push_str(&format!("  (provider emits {})", expected));
        }
    }
    out
}
