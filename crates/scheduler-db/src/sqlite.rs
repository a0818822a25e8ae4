//! SQLite-backed `JobStore`.
//!
//! Every query is parameterised through `rusqlite::params!`; none of this
//! file ever formats caller-supplied data into a SQL string. There is no
//! raw-SQL execution path reachable from here or from anything built on
//! top of it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;

use scheduler_core::{
    HistoryEntry, HistoryId, HistoryStatus, IntervalUnit, Job, JobId, JobKind, JobPatch,
    JobSpec, JobStatus, JobStore, ListHistoryFilter, SchedulerError,
};

use crate::{migrations, DbError, DbResult};

type Result<T> = std::result::Result<T, SchedulerError>;

/// Single connection, guarded by an async mutex. Every `JobStore` method
/// runs as one atomic transaction; one connection makes that true
/// without a pool to misconfigure.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn kind_to_str(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Once => "once",
        JobKind::Recurring => "recurring",
    }
}

fn kind_from_str(s: &str) -> DbResult<JobKind> {
    match s {
        "once" => Ok(JobKind::Once),
        "recurring" => Ok(JobKind::Recurring),
        other => Err(DbError::Sqlite(rusqlite::Error::InvalidParameterName(
            format!("unrecognised job kind: {other}"),
        ))),
    }
}

fn unit_to_str(unit: IntervalUnit) -> &'static str {
    match unit {
        IntervalUnit::Minute => "minute",
        IntervalUnit::Hour => "hour",
        IntervalUnit::Day => "day",
        IntervalUnit::Week => "week",
        IntervalUnit::Month => "month",
    }
}

fn unit_from_str(s: &str) -> DbResult<IntervalUnit> {
    match s {
        "minute" => Ok(IntervalUnit::Minute),
        "hour" => Ok(IntervalUnit::Hour),
        "day" => Ok(IntervalUnit::Day),
        "week" => Ok(IntervalUnit::Week),
        "month" => Ok(IntervalUnit::Month),
        other => Err(DbError::Sqlite(rusqlite::Error::InvalidParameterName(
            format!("unrecognised interval unit: {other}"),
        ))),
    }
}

fn status_to_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Active => "active",
        JobStatus::Paused => "paused",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

fn status_from_str(s: &str) -> DbResult<JobStatus> {
    match s {
        "pending" => Ok(JobStatus::Pending),
        "active" => Ok(JobStatus::Active),
        "paused" => Ok(JobStatus::Paused),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" => Ok(JobStatus::Cancelled),
        other => Err(DbError::Sqlite(rusqlite::Error::InvalidParameterName(
            format!("unrecognised job status: {other}"),
        ))),
    }
}

fn history_status_to_str(status: HistoryStatus) -> &'static str {
    match status {
        HistoryStatus::Sending => "sending",
        HistoryStatus::Sent => "sent",
        HistoryStatus::Failed => "failed",
        HistoryStatus::Unknown => "unknown",
        HistoryStatus::Skipped => "skipped",
    }
}

fn history_status_from_str(s: &str) -> DbResult<HistoryStatus> {
    match s {
        "sending" => Ok(HistoryStatus::Sending),
        "sent" => Ok(HistoryStatus::Sent),
        "failed" => Ok(HistoryStatus::Failed),
        "unknown" => Ok(HistoryStatus::Unknown),
        "skipped" => Ok(HistoryStatus::Skipped),
        other => Err(DbError::Sqlite(rusqlite::Error::InvalidParameterName(
            format!("unrecognised history status: {other}"),
        ))),
    }
}

fn dt_to_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn dt_from_str(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DbError::Sqlite(rusqlite::Error::InvalidParameterName(e.to_string())))
}

fn opt_dt_to_string(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(dt_to_string)
}

fn opt_dt_from_str(s: Option<String>) -> DbResult<Option<DateTime<Utc>>> {
    s.map(|s| dt_from_str(&s)).transpose()
}

struct RawJobRow {
    id: String,
    kind: String,
    contact_name: String,
    message: String,
    anchor_time: String,
    interval_value: Option<i64>,
    interval_unit: Option<String>,
    tolerance_minutes: Option<i64>,
    status: String,
    next_run: Option<String>,
    last_run: Option<String>,
    created_at: String,
}

fn read_job_row(row: &Row) -> rusqlite::Result<RawJobRow> {
    Ok(RawJobRow {
        id: row.get("id")?,
        kind: row.get("kind")?,
        contact_name: row.get("contact_name")?,
        message: row.get("message")?,
        anchor_time: row.get("anchor_time")?,
        interval_value: row.get("interval_value")?,
        interval_unit: row.get("interval_unit")?,
        tolerance_minutes: row.get("tolerance_minutes")?,
        status: row.get("status")?,
        next_run: row.get("next_run")?,
        last_run: row.get("last_run")?,
        created_at: row.get("created_at")?,
    })
}

fn raw_into_job(raw: RawJobRow) -> DbResult<Job> {
    Ok(Job {
        id: JobId::from(raw.id),
        kind: kind_from_str(&raw.kind)?,
        contact_name: raw.contact_name,
        message: raw.message,
        anchor_time: dt_from_str(&raw.anchor_time)?,
        interval_value: raw.interval_value.map(|v| v as u32),
        interval_unit: raw.interval_unit.as_deref().map(unit_from_str).transpose()?,
        tolerance_minutes: raw.tolerance_minutes.map(|v| v as u32),
        status: status_from_str(&raw.status)?,
        next_run: opt_dt_from_str(raw.next_run)?,
        last_run: opt_dt_from_str(raw.last_run)?,
        created_at: dt_from_str(&raw.created_at)?,
    })
}

struct RawHistoryRow {
    id: String,
    job_id: Option<String>,
    kind: String,
    contact_name: String,
    message: String,
    status: String,
    timestamp: String,
    error: Option<String>,
}

fn read_history_row(row: &Row) -> rusqlite::Result<RawHistoryRow> {
    Ok(RawHistoryRow {
        id: row.get("id")?,
        job_id: row.get("job_id")?,
        kind: row.get("kind")?,
        contact_name: row.get("contact_name")?,
        message: row.get("message")?,
        status: row.get("status")?,
        timestamp: row.get("timestamp")?,
        error: row.get("error")?,
    })
}

fn raw_into_history(raw: RawHistoryRow) -> DbResult<HistoryEntry> {
    Ok(HistoryEntry {
        id: HistoryId::from(raw.id),
        job_id: raw.job_id.map(JobId::from),
        kind: kind_from_str(&raw.kind)?,
        contact_name: raw.contact_name,
        message: raw.message,
        status: history_status_from_str(&raw.status)?,
        timestamp: dt_from_str(&raw.timestamp)?,
        error: raw.error,
    })
}

const JOB_COLUMNS: &str = "id, kind, contact_name, message, anchor_time, interval_value, \
     interval_unit, tolerance_minutes, status, next_run, last_run, created_at";

#[async_trait]
impl JobStore for SqliteStore {
    async fn create(&self, spec: JobSpec) -> Result<Job> {
        spec.validate()?;
        let job = Job::from_spec(JobId::new(), spec, Utc::now());
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO jobs ({JOB_COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)"),
            params![
                job.id.as_str(),
                kind_to_str(job.kind),
                job.contact_name,
                job.message,
                dt_to_string(job.anchor_time),
                job.interval_value,
                job.interval_unit.map(unit_to_str),
                job.tolerance_minutes,
                status_to_str(job.status),
                opt_dt_to_string(job.next_run),
                opt_dt_to_string(job.last_run),
                dt_to_string(job.created_at),
            ],
        )
        .map_err(DbError::from)?;
        Ok(job)
    }

    async fn get(&self, id: &JobId) -> Result<Option<Job>> {
        let conn = self.conn.lock().await;
        let raw = conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id.as_str()],
                read_job_row,
            )
            .optional()
            .map_err(DbError::from)?;
        raw.map(raw_into_job).transpose().map_err(Into::into)
    }

    async fn list(&self) -> Result<Vec<Job>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC"
            ))
            .map_err(DbError::from)?;
        let rows = stmt
            .query_map([], read_job_row)
            .map_err(DbError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| raw_into_job(r).map_err(Into::into))
            .collect()
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Job>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'active' AND (
                    (kind = 'once' AND anchor_time <= ?1)
                    OR (kind = 'recurring' AND next_run <= ?1)
                )"
            ))
            .map_err(DbError::from)?;
        let now_str = dt_to_string(now);
        let rows = stmt
            .query_map(params![now_str], read_job_row)
            .map_err(DbError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| raw_into_job(r).map_err(Into::into))
            .collect()
    }

    async fn update(&self, id: &JobId, patch: JobPatch) -> Result<Job> {
        let conn = self.conn.lock().await;
        let raw = conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id.as_str()],
                read_job_row,
            )
            .optional()
            .map_err(DbError::from)?;
        let Some(raw) = raw else {
            return Err(SchedulerError::JobNotFound { id: id.to_string() });
        };
        let mut job = raw_into_job(raw)?;

        if let Some(v) = patch.contact_name {
            job.contact_name = v;
        }
        if let Some(v) = patch.message {
            job.message = v;
        }
        if let Some(v) = patch.anchor_time {
            job.anchor_time = scheduler_core::clock::truncate_to_minute(v);
        }
        if let Some(v) = patch.interval_value {
            job.interval_value = Some(v);
        }
        if let Some(v) = patch.interval_unit {
            job.interval_unit = Some(v);
        }
        if let Some(v) = patch.tolerance_minutes {
            job.tolerance_minutes = Some(v);
        }
        if let Some(new_kind) = patch.kind {
            if new_kind != job.kind {
                match new_kind {
                    JobKind::Once => {
                        job.interval_value = None;
                        job.interval_unit = None;
                        job.tolerance_minutes = None;
                        job.next_run = None;
                    }
                    JobKind::Recurring => {
                        job.next_run = Some(job.anchor_time);
                    }
                }
                job.kind = new_kind;
            }
        }

        let spec_check = JobSpec {
            kind: job.kind,
            contact_name: job.contact_name.clone(),
            message: job.message.clone(),
            anchor_time: job.anchor_time,
            interval_value: job.interval_value,
            interval_unit: job.interval_unit,
            tolerance_minutes: job.tolerance_minutes,
        };
        spec_check.validate()?;

        conn.execute(
            "UPDATE jobs SET kind=?1, contact_name=?2, message=?3, anchor_time=?4, \
             interval_value=?5, interval_unit=?6, tolerance_minutes=?7, next_run=?8 \
             WHERE id=?9",
            params![
                kind_to_str(job.kind),
                job.contact_name,
                job.message,
                dt_to_string(job.anchor_time),
                job.interval_value,
                job.interval_unit.map(unit_to_str),
                job.tolerance_minutes,
                opt_dt_to_string(job.next_run),
                id.as_str(),
            ],
        )
        .map_err(DbError::from)?;

        Ok(job)
    }

    async fn set_status(
        &self,
        id: &JobId,
        status: JobStatus,
        next_run: Option<DateTime<Utc>>,
        last_run: Option<DateTime<Utc>>,
    ) -> Result<Job> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                "UPDATE jobs SET status=?1, next_run=?2, last_run=COALESCE(?3, last_run) WHERE id=?4",
                params![
                    status_to_str(status),
                    opt_dt_to_string(next_run),
                    opt_dt_to_string(last_run),
                    id.as_str(),
                ],
            )
            .map_err(DbError::from)?;
        if changed == 0 {
            return Err(SchedulerError::JobNotFound { id: id.to_string() });
        }
        let raw = conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id.as_str()],
                read_job_row,
            )
            .map_err(DbError::from)?;
        raw_into_job(raw).map_err(Into::into)
    }

    async fn delete(&self, id: &JobId) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute("DELETE FROM jobs WHERE id = ?1", params![id.as_str()])
            .map_err(DbError::from)?;
        if changed == 0 {
            return Err(SchedulerError::JobNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn history_append(&self, entry: HistoryEntry) -> Result<HistoryId> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO history (id, job_id, kind, contact_name, message, status, timestamp, error) \
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                entry.id.as_str(),
                entry.job_id.as_ref().map(JobId::as_str),
                kind_to_str(entry.kind),
                entry.contact_name,
                entry.message,
                history_status_to_str(entry.status),
                dt_to_string(entry.timestamp),
                entry.error,
            ],
        )
        .map_err(DbError::from)?;
        Ok(entry.id)
    }

    async fn history_update(
        &self,
        id: &HistoryId,
        status: HistoryStatus,
        error: Option<String>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                "UPDATE history SET status=?1, error=?2 WHERE id=?3",
                params![history_status_to_str(status), error, id.as_str()],
            )
            .map_err(DbError::from)?;
        if changed == 0 {
            return Err(SchedulerError::store(format!(
                "history entry not found: {id}"
            )));
        }
        Ok(())
    }

    async fn list_history(&self, filter: ListHistoryFilter) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn.lock().await;
        let limit = filter.limit.unwrap_or(1000) as i64;
        let rows = match filter.job_id {
            Some(job_id) => {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, job_id, kind, contact_name, message, status, timestamp, error \
                         FROM history WHERE job_id = ?1 ORDER BY timestamp DESC LIMIT ?2",
                    )
                    .map_err(DbError::from)?;
                let result = stmt
                    .query_map(params![job_id.as_str(), limit], read_history_row)
                    .map_err(DbError::from)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(DbError::from)?;
                result
            }
            None => {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, job_id, kind, contact_name, message, status, timestamp, error \
                         FROM history ORDER BY timestamp DESC LIMIT ?1",
                    )
                    .map_err(DbError::from)?;
                let result = stmt
                    .query_map(params![limit], read_history_row)
                    .map_err(DbError::from)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(DbError::from)?;
                result
            }
        };
        rows.into_iter()
            .map(|r| raw_into_history(r).map_err(Into::into))
            .collect()
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| DbError::from(e).into())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(DbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec_once(anchor: DateTime<Utc>) -> JobSpec {
        JobSpec {
            kind: JobKind::Once,
            contact_name: "Alice".into(),
            message: "hi".into(),
            anchor_time: anchor,
            interval_value: None,
            interval_unit: None,
            tolerance_minutes: None,
        }
    }

    fn spec_recurring(anchor: DateTime<Utc>) -> JobSpec {
        JobSpec {
            kind: JobKind::Recurring,
            contact_name: "Bob".into(),
            message: "reminder".into(),
            anchor_time: anchor,
            interval_value: Some(1),
            interval_unit: Some(IntervalUnit::Hour),
            tolerance_minutes: Some(10),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let job = store.create(spec_once(anchor)).await.unwrap();
        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.contact_name, "Alice");
        assert_eq!(fetched.status, JobStatus::Active);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get(&JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_due_filters_by_status_and_time() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let job = store.create(spec_once(anchor)).await.unwrap();

        let due = store.list_due(anchor).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, job.id);

        let too_early = anchor - chrono::Duration::minutes(1);
        assert!(store.list_due(too_early).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_due_excludes_paused() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let job = store.create(spec_recurring(anchor)).await.unwrap();
        store
            .set_status(&job.id, JobStatus::Paused, None, None)
            .await
            .unwrap();
        assert!(store.list_due(anchor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_type_change_once_to_recurring_sets_next_run() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let job = store.create(spec_once(anchor)).await.unwrap();
        let patch = JobPatch {
            kind: Some(JobKind::Recurring),
            interval_value: Some(1),
            interval_unit: Some(IntervalUnit::Day),
            ..Default::default()
        };
        let updated = store.update(&job.id, patch).await.unwrap();
        assert_eq!(updated.kind, JobKind::Recurring);
        assert_eq!(updated.next_run, Some(anchor));
    }

    #[tokio::test]
    async fn test_update_type_change_recurring_to_once_clears_fields() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let job = store.create(spec_recurring(anchor)).await.unwrap();
        let patch = JobPatch {
            kind: Some(JobKind::Once),
            ..Default::default()
        };
        let updated = store.update(&job.id, patch).await.unwrap();
        assert_eq!(updated.kind, JobKind::Once);
        assert!(updated.interval_value.is_none());
        assert!(updated.next_run.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_job_returns_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store.update(&JobId::new(), JobPatch::default()).await;
        assert!(matches!(result, Err(SchedulerError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_cascades_history() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let job = store.create(spec_once(anchor)).await.unwrap();
        let entry = HistoryEntry::new_sending(
            HistoryId::new(),
            Some(job.id.clone()),
            JobKind::Once,
            job.contact_name.clone(),
            job.message.clone(),
            anchor,
        );
        store.history_append(entry).await.unwrap();

        store.delete(&job.id).await.unwrap();

        let remaining = store
            .list_history(ListHistoryFilter {
                job_id: Some(job.id.clone()),
                limit: None,
            })
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_history_append_and_update() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let job = store.create(spec_once(anchor)).await.unwrap();
        let entry = HistoryEntry::new_sending(
            HistoryId::new(),
            Some(job.id.clone()),
            JobKind::Once,
            job.contact_name.clone(),
            job.message.clone(),
            anchor,
        );
        let hid = store.history_append(entry).await.unwrap();
        store
            .history_update(&hid, HistoryStatus::Sent, None)
            .await
            .unwrap();

        let history = store
            .list_history(ListHistoryFilter { job_id: Some(job.id), limit: None })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, HistoryStatus::Sent);
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_setting("k").await.unwrap().is_none());
        store.set_setting("k", "v1").await.unwrap();
        assert_eq!(store.get_setting("k").await.unwrap(), Some("v1".into()));
        store.set_setting("k", "v2").await.unwrap();
        assert_eq!(store.get_setting("k").await.unwrap(), Some("v2".into()));
    }

    #[tokio::test]
    async fn test_list_returns_reverse_creation_order() {
        let store = SqliteStore::in_memory().unwrap();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let first = store.create(spec_once(anchor)).await.unwrap();
        let second = store.create(spec_once(anchor)).await.unwrap();
        let jobs = store.list().await.unwrap();
        assert!(jobs.iter().any(|j| j.id == first.id));
        assert!(jobs.iter().any(|j| j.id == second.id));
    }
}
