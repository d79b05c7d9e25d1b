//! Index commands

use clap::Subcommand;
use research_store::{HypothesisStorage, IndexEntry, IndexFilter};
use research_types::{HypothesisCategory, HypothesisConfidence, HypothesisState, SessionId};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliResult;
use crate::output::{self, print_success, OutputFormat};

/// Index subcommands
#[derive(Subcommand)]
pub enum IndexCommands {
    /// Rebuild the index from every session file
    Rebuild,

    /// Show index entries, optionally filtered
    Show {
        /// Session code
        #[arg(long)]
        session: Option<SessionId>,

        /// Lifecycle state
        #[arg(long)]
        state: Option<HypothesisState>,

        /// Category
        #[arg(long)]
        category: Option<HypothesisCategory>,

        /// Confidence
        #[arg(long)]
        confidence: Option<HypothesisConfidence>,

        /// Only entries with (true) or without (false) a mechanism
        #[arg(long)]
        has_mechanism: Option<bool>,
    },

    /// Aggregate counts by state, category, confidence and session
    Summary,
}

/// Table row for index entries
#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    id: String,
    session: String,
    state: String,
    category: String,
    confidence: String,
    mechanism: bool,
    critiques: u32,
    updated: String,
}

impl From<IndexEntry> for EntryRow {
    fn from(e: IndexEntry) -> Self {
        Self {
            id: e.id.to_string(),
            session: e.session_id.to_string(),
            state: e.state.to_string(),
            category: e.category.to_string(),
            confidence: e.confidence.to_string(),
            mechanism: e.has_mechanism,
            critiques: e.unresolved_critique_count,
            updated: e.last_updated.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute an index command
pub async fn execute(
    command: IndexCommands,
    storage: &HypothesisStorage,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        IndexCommands::Rebuild => {
            let index = storage.rebuild_index().await?;
            print_success(&format!("Indexed {} hypotheses", index.len()));
            Ok(())
        }

        IndexCommands::Show {
            session,
            state,
            category,
            confidence,
            has_mechanism,
        } => {
            let filter = IndexFilter {
                session,
                state,
                category,
                confidence,
                has_mechanism,
            };
            let entries = storage.filter_index(&filter).await?;
            match format {
                OutputFormat::Json => output::print_single(&entries),
                OutputFormat::Table => {
                    output::print_output(entries.into_iter().map(EntryRow::from).collect(), format)
                }
            }
        }

        IndexCommands::Summary => output::print_single(&storage.index_summary().await?),
    }
}
