//! `job` command implementations. Operate on the database directly
//! rather than through the HTTP API, so a job can be inspected or
//! repaired without the server running.

use anyhow::{anyhow, Result};
use colored::Colorize;
use tabled::{Table, Tabled};

use scheduler_core::{IntervalUnit, Job, JobId, JobKind, JobSpec, JobStatus, JobStore};
use scheduler_db::SqliteStore;

use crate::JobCommands;

pub async fn run(database: &str, action: &JobCommands, json_output: bool) -> Result<()> {
    let store = SqliteStore::open(database)?;

    match action {
        JobCommands::Create {
            kind,
            contact_name,
            message,
            anchor,
            interval_value,
            interval_unit,
            tolerance_minutes,
        } => {
            create_job(
                &store,
                kind,
                contact_name,
                message,
                anchor,
                *interval_value,
                interval_unit.as_deref(),
                *tolerance_minutes,
                json_output,
            )
            .await
        }

        JobCommands::List => list_jobs(&store, json_output).await,

        JobCommands::Get { id } => get_job(&store, id, json_output).await,

        JobCommands::Pause { id } => set_status(&store, id, JobStatus::Paused, json_output).await,

        JobCommands::Resume { id } => set_status(&store, id, JobStatus::Active, json_output).await,

        JobCommands::Delete { id } => delete_job(&store, id, json_output).await,
    }
}

fn parse_unit(s: &str) -> Result<IntervalUnit> {
    match s {
        "minute" => Ok(IntervalUnit::Minute),
        "hour" => Ok(IntervalUnit::Hour),
        "day" => Ok(IntervalUnit::Day),
        "week" => Ok(IntervalUnit::Week),
        "month" => Ok(IntervalUnit::Month),
        other => Err(anyhow!("unknown interval unit: {other}")),
    }
}

#[allow(clippy::too_many_arguments)]
async fn create_job(
    store: &SqliteStore,
    kind: &str,
    contact_name: &str,
    message: &str,
    anchor: &str,
    interval_value: Option<u32>,
    interval_unit: Option<&str>,
    tolerance_minutes: Option<u32>,
    json_output: bool,
) -> Result<()> {
    let kind = match kind {
        "once" => JobKind::Once,
        "recurring" => JobKind::Recurring,
        other => return Err(anyhow!("unknown job kind: {other}")),
    };
    let anchor_time = chrono::DateTime::parse_from_rfc3339(anchor)?.with_timezone(&chrono::Utc);
    let interval_unit = interval_unit.map(parse_unit).transpose()?;

    let spec = JobSpec {
        kind,
        contact_name: contact_name.to_string(),
        message: message.to_string(),
        anchor_time,
        interval_value,
        interval_unit,
        tolerance_minutes,
    };
    spec.validate()?;

    let job = store.create(spec).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        println!("{} Job created: {}", "✓".green(), job.id.to_string().cyan());
    }

    Ok(())
}

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Contact")]
    contact_name: String,
    #[tabled(rename = "Next Run")]
    next_run: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            kind: format!("{:?}", job.kind).to_lowercase(),
            status: format!("{:?}", job.status).to_lowercase(),
            contact_name: job.contact_name.clone(),
            next_run: job
                .next_run
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

async fn list_jobs(store: &SqliteStore, json_output: bool) -> Result<()> {
    let jobs = store.list().await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
        return Ok(());
    }

    let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
    println!("{}", Table::new(rows));

    Ok(())
}

async fn get_job(store: &SqliteStore, id: &str, json_output: bool) -> Result<()> {
    let job_id = JobId::from(id.to_string());
    let job = store
        .get(&job_id)
        .await?
        .ok_or_else(|| anyhow!("job not found: {id}"))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        println!("{}", "Job Details".green().bold());
        println!("  ID:        {}", job.id.to_string().cyan());
        println!("  Kind:      {:?}", job.kind);
        println!("  Status:    {:?}", job.status);
        println!("  Contact:   {}", job.contact_name);
        println!("  Message:   {}", job.message);
        println!("  Anchor:    {}", job.anchor_time);
        if let Some(v) = job.interval_value {
            println!("  Interval:  {} {:?}", v, job.interval_unit.unwrap());
        }
        if let Some(t) = job.tolerance_minutes {
            println!("  Tolerance: {t}m");
        }
        println!(
            "  Next Run:  {}",
            job.next_run
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        );
        println!(
            "  Last Run:  {}",
            job.last_run
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}

async fn set_status(
    store: &SqliteStore,
    id: &str,
    target: JobStatus,
    json_output: bool,
) -> Result<()> {
    let job_id = JobId::from(id.to_string());
    let mut job = store
        .get(&job_id)
        .await?
        .ok_or_else(|| anyhow!("job not found: {id}"))?;

    match target {
        JobStatus::Paused => {
            job.pause()?;
            store
                .set_status(&job_id, JobStatus::Paused, None, job.last_run)
                .await?;
        }
        JobStatus::Active => {
            let now = chrono::Utc::now();
            let next_run = scheduler_core::recurrence::next_slot(&job, now, false);
            job.resume(next_run)?;
            store
                .set_status(&job_id, JobStatus::Active, Some(next_run), job.last_run)
                .await?;
        }
        other => return Err(anyhow!("unsupported target status: {other:?}")),
    }

    if json_output {
        println!("{}", serde_json::json!({"id": id, "status": format!("{:?}", target).to_lowercase()}));
    } else {
        println!(
            "{} Job {} -> {}",
            "✓".green(),
            id.cyan(),
            format!("{target:?}").to_lowercase()
        );
    }

    Ok(())
}

async fn delete_job(store: &SqliteStore, id: &str, json_output: bool) -> Result<()> {
    let job_id = JobId::from(id.to_string());
    store
        .get(&job_id)
        .await?
        .ok_or_else(|| anyhow!("job not found: {id}"))?;
    store.delete(&job_id).await?;

    if json_output {
        println!("{}", serde_json::json!({"id": id, "deleted": true}));
    } else {
        println!("{} Job deleted: {}", "✓".green(), id.cyan());
    }

    Ok(())
}
