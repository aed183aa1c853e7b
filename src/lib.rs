//! # Recall Harness
//!
//! Selection-driven passage recall for a reading tool.
//!
//! Given a piece of selected text, Recall Harness finds the most similar
//! sections in the user's active documents and in a historical archive,
//! merges and labels them by relation (contradiction, example, supporting,
//! related), and builds a "time machine" that traces when each idea first
//! appeared and when it was last contradicted.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │ Selection  │──▶│   Embedding  │──▶│ EmbeddingIndex     │
//! │   text     │   │   provider   │   │ documents/historical│
//! └────────────┘   └──────────────┘   └─────────┬─────────┘
//!                                               ▼
//!                                     ┌───────────────────┐
//!                                     │ merge + label +    │
//!                                     │ time machine (core)│
//!                                     └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rcl stats
//! rcl recommend "Result X holds for large samples"
//! rcl search "sampling bias" --scope historical --limit 10
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers (OpenAI, Ollama) |
//! | [`index`] | Persisted index loading and caching |
//! | [`service`] | Retrieval orchestration |
//! | [`search`] | `rcl search` output |
//! | [`recommend`] | `rcl recommend` output |
//! | [`stats`] | Index statistics |

pub mod config;
pub mod embedding;
pub mod index;
pub mod recommend;
pub mod search;
pub mod service;
pub mod stats;
