//! # Recall Harness CLI (`rcl`)
//!
//! The `rcl` binary runs selection-driven recall against the persisted
//! embedding indexes named in the configuration file.
//!
//! ## Usage
//!
//! ```bash
//! rcl --config ./config/rcl.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rcl recommend "<text>"` | Related passages from both scopes, plus the time machine |
//! | `rcl search "<text>" --scope <scope>` | Semantic search over one scope |
//! | `rcl stats` | Summarize the index directories |
//! | `rcl completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! # Recommendations as JSON
//! rcl recommend "the effect disappears at scale" --json
//!
//! # Ten closest sections from the archive
//! rcl search "sampling bias" --scope historical --limit 10
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use recall_harness::config::{self, Config};
use recall_harness::embedding::create_provider;
use recall_harness::service::{RetrievalService, Scope};
use recall_harness::{recommend, search, stats};

/// Recall Harness CLI: selection-driven passage recall over a working
/// corpus and a historical archive.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/rcl.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "rcl",
    about = "Recall Harness: related passages and idea provenance for a text selection",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rcl.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend related passages from both scopes.
    ///
    /// Embeds the text, searches the documents and historical directories,
    /// then merges, deduplicates, labels and ranks the candidates.
    Recommend {
        /// Selected text.
        text: String,

        /// Maximum number of recommendations (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the full response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Semantic search over a single scope.
    Search {
        /// Query text.
        text: String,

        /// Which index directory to search.
        #[arg(long, value_enum, default_value_t = Scope::Documents)]
        scope: Scope,

        /// Maximum number of results (defaults to `retrieval.candidates_per_dir`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics for both scopes.
    Stats,

    /// Generate a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "rcl", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg);

    let provider = create_provider(&cfg.embedding)?;
    let service = RetrievalService::new(cfg, provider);

    match cli.command {
        Commands::Recommend { text, top_k, json } => {
            recommend::run_recommend(&service, &text, top_k, json).await?;
        }
        Commands::Search {
            text,
            scope,
            limit,
            json,
        } => {
            search::run_search(&service, &text, scope, limit, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&service)?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides `[logging].level`.
fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
