//! `history` command implementations.

use anyhow::Result;
use colored::Colorize;
use tabled::{Table, Tabled};

use scheduler_core::{HistoryEntry, HistoryStatus, JobId, JobStore, ListHistoryFilter};
use scheduler_db::SqliteStore;

use crate::HistoryCommands;

pub async fn run(database: &str, action: &HistoryCommands, json_output: bool) -> Result<()> {
    let store = SqliteStore::open(database)?;

    match action {
        HistoryCommands::List { job_id, limit } => {
            list_history(&store, job_id.as_deref(), *limit, json_output).await
        }
    }
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "Job")]
    job_id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Contact")]
    contact_name: String,
    #[tabled(rename = "Error")]
    error: String,
}

fn colored_status(status: HistoryStatus) -> colored::ColoredString {
    let text = format!("{status:?}").to_lowercase();
    match status {
        HistoryStatus::Sent => text.green(),
        HistoryStatus::Failed => text.red(),
        HistoryStatus::Unknown => text.yellow(),
        HistoryStatus::Skipped => text.yellow(),
        HistoryStatus::Sending => text.blue(),
    }
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            timestamp: entry.timestamp.to_rfc3339(),
            job_id: entry
                .job_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            status: colored_status(entry.status).to_string(),
            contact_name: entry.contact_name.clone(),
            error: entry.error.clone().unwrap_or_default(),
        }
    }
}

async fn list_history(
    store: &SqliteStore,
    job_id: Option<&str>,
    limit: Option<usize>,
    json_output: bool,
) -> Result<()> {
    let filter = ListHistoryFilter {
        job_id: job_id.map(|s| JobId::from(s.to_string())),
        limit,
    };
    let entries = store.list_history(filter).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No history entries found.".yellow());
        return Ok(());
    }

    let rows: Vec<HistoryRow> = entries.iter().map(HistoryRow::from).collect();
    println!("{}", Table::new(rows));

    Ok(())
}
