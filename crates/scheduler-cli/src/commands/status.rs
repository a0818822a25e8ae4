//! `status` command: a one-shot health/readiness summary, useful for
//! smoke-testing a deployment without standing up the API.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use scheduler_core::{JobStatus, JobStore};
use scheduler_db::SqliteStore;
use scheduler_dispatch::{ExternalMessageSender, HealthChecker};

pub async fn run(database: &str, json_output: bool) -> Result<()> {
    let store = SqliteStore::open(database)?;
    let jobs = store.list().await?;

    let active = jobs.iter().filter(|j| j.status == JobStatus::Active).count();
    let paused = jobs.iter().filter(|j| j.status == JobStatus::Paused).count();
    let completed = jobs.iter().filter(|j| j.status == JobStatus::Completed).count();
    let failed = jobs.iter().filter(|j| j.status == JobStatus::Failed).count();
    let total = jobs.len();

    let sender = Arc::new(ExternalMessageSender::new(
        "http://127.0.0.1:9000".to_string(),
        std::time::Duration::from_secs(scheduler_core::MIN_SEND_TIMEOUT_SECS),
    ));
    let health = HealthChecker::new(sender, scheduler_core::Metrics::new());
    let readiness = health.readiness().await;

    if json_output {
        println!(
            "{}",
            serde_json::json!({
                "database": database,
                "total_jobs": total,
                "active": active,
                "paused": paused,
                "completed": completed,
                "failed": failed,
                "sender_ready": readiness.ready,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })
        );
    } else {
        println!("{}", "Message Scheduler Status".green().bold());
        println!("{}", "=".repeat(40));
        println!();
        println!("  Database: {}", database.cyan());
        println!();
        println!("  {} Total Jobs", total.to_string().white().bold());
        println!("  {} Active", format!("{active:>6}").green());
        println!("  {} Paused", format!("{paused:>6}").yellow());
        println!("  {} Completed", format!("{completed:>6}").blue());
        println!("  {} Failed", format!("{failed:>6}").red());
        println!();
        let ready_text = if readiness.ready {
            "ready".green()
        } else {
            "not ready".red()
        };
        println!("  Message sender: {ready_text}");
        println!();
        println!("  Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    }

    Ok(())
}
