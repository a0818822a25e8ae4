//! Message Scheduler CLI
//!
//! Operator entry point: the `serve` subcommand is the composition
//! root that wires Config, Clock, JobStore, Notifier, MessageSender,
//! and Scheduler together and starts both the dispatch ticker and the
//! HTTP API. The remaining subcommands operate on the database
//! directly for quick inspection and one-off job management without
//! standing up the server.
//!
//! # Usage
//!
//! ```bash
//! # Start the scheduler and API
//! scheduler serve --bind 0.0.0.0:8080
//!
//! # Create a recurring job
//! scheduler job create --kind recurring --contact-name Alice \
//!     --message "Stand-up" --anchor 2025-01-01T09:00:00Z \
//!     --interval-value 1 --interval-unit day
//!
//! # List jobs
//! scheduler job list
//!
//! # One-shot health/readiness summary
//! scheduler status
//! ```

mod commands;

use clap::{Parser, Subcommand};

/// Message Scheduler CLI - local-first personal messaging scheduler
#[derive(Parser)]
#[command(name = "scheduler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Database path
    #[arg(short, long, default_value = "scheduler.db", env = "SCHED_DATABASE_PATH")]
    database: String,

    /// Log level
    #[arg(short, long, default_value = "info", env = "SCHED_LOG_LEVEL")]
    log_level: String,

    /// Output format (text, json)
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dispatch loop and the HTTP API (composition root)
    Serve {
        /// Address to bind the HTTP API to
        #[arg(short = 'b', long, default_value = "127.0.0.1:8080")]
        bind: String,

        /// API key required on mutating routes
        #[arg(short, long, env = "SCHED_API_KEY")]
        api_key: Option<String>,

        /// Base URL of the external message-delivery service
        #[arg(long, default_value = "http://127.0.0.1:9000")]
        sender_url: String,

        /// Webhook URL to additionally notify on every dispatch outcome
        #[arg(long)]
        webhook_url: Option<String>,

        /// Shared secret used to HMAC-sign webhook payloads
        #[arg(long, env = "SCHED_WEBHOOK_SECRET")]
        webhook_secret: Option<String>,

        /// Dispatch tick interval in seconds
        #[arg(long, default_value = "60")]
        tick_interval_secs: u64,
    },

    /// Job management commands
    Job {
        #[command(subcommand)]
        action: JobCommands,
    },

    /// History inspection commands
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Show a one-shot health/readiness summary
    Status,
}

#[derive(Subcommand)]
enum JobCommands {
    /// Create a new job
    Create {
        /// Job kind: once or recurring
        #[arg(short, long)]
        kind: String,

        /// Contact to send the message to
        #[arg(long)]
        contact_name: String,

        /// Message body
        #[arg(short, long)]
        message: String,

        /// Anchor time, ISO-8601 (e.g. 2025-01-01T09:00:00Z)
        #[arg(short, long)]
        anchor: String,

        /// Interval magnitude (required for recurring jobs)
        #[arg(long)]
        interval_value: Option<u32>,

        /// Interval unit: minute, hour, day, week, month
        #[arg(long)]
        interval_unit: Option<String>,

        /// Maximum lateness in minutes before a slot is skipped
        #[arg(long)]
        tolerance_minutes: Option<u32>,
    },

    /// List jobs, newest first
    List,

    /// Get job details
    Get {
        /// Job ID
        id: String,
    },

    /// Pause an active job
    Pause {
        /// Job ID
        id: String,
    },

    /// Resume a paused job
    Resume {
        /// Job ID
        id: String,
    },

    /// Delete a job and its history
    Delete {
        /// Job ID
        id: String,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List history entries, newest first
    List {
        /// Filter by job ID
        #[arg(long)]
        job_id: Option<String>,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level.clone())
        .init();

    let json_output = cli.format == OutputFormat::Json;

    match &cli.command {
        Commands::Serve {
            bind,
            api_key,
            sender_url,
            webhook_url,
            webhook_secret,
            tick_interval_secs,
        } => {
            commands::serve::run(
                &cli.database,
                bind,
                api_key.clone(),
                sender_url,
                webhook_url.clone(),
                webhook_secret.clone(),
                *tick_interval_secs,
            )
            .await
        }

        Commands::Job { action } => commands::job::run(&cli.database, action, json_output).await,

        Commands::History { action } => {
            commands::history::run(&cli.database, action, json_output).await
        }

        Commands::Status => commands::status::run(&cli.database, json_output).await,
    }
}
