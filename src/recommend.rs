//! `rcl recommend`: related passages from both scopes plus the time machine.

use anyhow::Result;

use recall_harness_core::models::{MergedItem, TimeMachineEntry};

use crate::service::RetrievalService;

pub async fn run_recommend(
    service: &RetrievalService,
    text: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let response = service.recommend(text, top_k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.recommendations.is_empty() {
        println!("No recommendations.");
        return Ok(());
    }

    for item in &response.recommendations {
        print_item(item);
    }

    if !response.time_machine.is_empty() {
        println!("Time machine");
        println!("------------");
        for entry in &response.time_machine {
            print_entry(entry);
        }
    }
    Ok(())
}

fn print_item(item: &MergedItem) {
    println!(
        "{}. [{:.2}] {}{}  <{}>",
        item.rank,
        item.score,
        item.document,
        item.page_number
            .map(|p| format!(" (p. {})", p))
            .unwrap_or_default(),
        item.label
    );
    println!("    snippet: \"{}\"", item.snippet.replace('\n', " ").trim());
    println!();
}

fn print_entry(entry: &TimeMachineEntry) {
    println!(
        "  {}  first seen {} in {}",
        entry.idea_key,
        entry.first_seen.format("%Y-%m-%d"),
        entry.first_doc
    );
    if let Some(ref c) = entry.latest_contradiction {
        println!(
            "    latest contradiction: {} ({})",
            c.document,
            c.when.format("%Y-%m-%d")
        );
    }
}
