//! Hypothesis commands

use std::path::PathBuf;

use clap::Subcommand;
use research_store::HypothesisStorage;
use research_types::Hypothesis;
use serde::Serialize;
use tabled::Tabled;

use crate::error::{CliError, CliResult};
use crate::output::{self, print_success, print_warning, OutputFormat};

const STATEMENT_WIDTH: usize = 60;

/// Hypothesis subcommands
#[derive(Subcommand)]
pub enum HypothesisCommands {
    /// List sessions with a persisted hypothesis file
    Sessions,

    /// List hypotheses, optionally for one session
    List {
        /// Session code
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Show one hypothesis
    Get {
        /// Hypothesis id (H-<SESSION>-<SEQ>)
        id: String,
    },

    /// List hypotheses in the active state
    Active,

    /// Case-insensitive search over statement, mechanism, notes, tags and id
    Search {
        /// Search text
        query: String,
    },

    /// Delete a hypothesis
    Delete {
        /// Hypothesis id
        id: String,
    },

    /// Save every hypothesis from a JSON array file
    Import {
        /// Path to a JSON file containing an array of hypotheses
        #[arg(short, long)]
        file: PathBuf,
    },
}

/// Table row for hypothesis display
#[derive(Debug, Serialize, Tabled)]
struct HypothesisRow {
    id: String,
    session: String,
    state: String,
    category: String,
    confidence: String,
    statement: String,
    updated: String,
}

impl From<Hypothesis> for HypothesisRow {
    fn from(h: Hypothesis) -> Self {
        Self {
            id: h.id.to_string(),
            session: h.session_id.to_string(),
            state: h.state.to_string(),
            category: h.category.to_string(),
            confidence: h.confidence.to_string(),
            statement: truncate(&h.statement, STATEMENT_WIDTH),
            updated: h.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    session: String,
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn print_hypotheses(list: Vec<Hypothesis>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => output::print_single(&list),
        OutputFormat::Table => {
            output::print_output(list.into_iter().map(HypothesisRow::from).collect(), format)
        }
    }
}

/// Execute a hypothesis command
pub async fn execute(
    command: HypothesisCommands,
    storage: &HypothesisStorage,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        HypothesisCommands::Sessions => {
            let rows: Vec<SessionRow> = storage
                .list_sessions()
                .await?
                .into_iter()
                .map(|s| SessionRow {
                    session: s.to_string(),
                })
                .collect();
            output::print_output(rows, format)
        }

        HypothesisCommands::List { session } => {
            let list = match session {
                Some(session) => storage.load_session_hypotheses(&session).await?,
                None => storage.get_all_hypotheses().await?,
            };
            print_hypotheses(list, format)
        }

        HypothesisCommands::Get { id } => match storage.get_hypothesis_by_id(&id).await? {
            Some(h) => output::print_single(&h),
            None => Err(CliError::NotFound(id)),
        },

        HypothesisCommands::Active => print_hypotheses(storage.get_active_hypotheses().await?, format),

        HypothesisCommands::Search { query } => {
            if query.trim().is_empty() {
                print_warning("Blank query matches nothing");
            }
            print_hypotheses(storage.search_hypotheses(&query).await?, format)
        }

        HypothesisCommands::Delete { id } => {
            if storage.delete_hypothesis(&id).await? {
                print_success(&format!("Deleted {id}"));
            } else {
                print_warning(&format!("{id} not found, nothing deleted"));
            }
            Ok(())
        }

        HypothesisCommands::Import { file } => {
            let contents = tokio::fs::read_to_string(&file).await?;
            let records: Vec<Hypothesis> = serde_json::from_str(&contents)?;
            let count = records.len();
            for record in records {
                storage.save_hypothesis(record).await?;
            }
            print_success(&format!("Imported {count} hypotheses from {}", file.display()));
            Ok(())
        }
    }
}
