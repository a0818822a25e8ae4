//! The narrow contracts the Scheduler holds with its collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SchedulerError;
use crate::history::{HistoryEntry, HistoryId, HistoryStatus};
use crate::job::{Job, JobId, JobSpec, JobStatus};

type Result<T> = std::result::Result<T, SchedulerError>;

/// Partial update applied by `JobStore::update`. `None` means "leave
/// unchanged"; there is no way to explicitly clear a field other than
/// the type-change rules the store applies itself.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub contact_name: Option<String>,
    pub message: Option<String>,
    pub anchor_time: Option<DateTime<Utc>>,
    pub interval_value: Option<u32>,
    pub interval_unit: Option<crate::job::IntervalUnit>,
    pub tolerance_minutes: Option<u32>,
    /// `Some(kind)` requests a kind change; triggers the §4.B type-change
    /// side effects on `nextRun`/interval fields.
    pub kind: Option<crate::job::JobKind>,
}

#[derive(Debug, Clone, Default)]
pub struct ListHistoryFilter {
    pub job_id: Option<JobId>,
    pub limit: Option<usize>,
}

/// Durable CRUD over Jobs and HistoryEntries. Every method is a single
/// atomic transaction from the caller's point of view.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, spec: JobSpec) -> Result<Job>;
    async fn get(&self, id: &JobId) -> Result<Option<Job>>;
    async fn list(&self) -> Result<Vec<Job>>;
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Job>>;
    async fn update(&self, id: &JobId, patch: JobPatch) -> Result<Job>;
    async fn set_status(
        &self,
        id: &JobId,
        status: JobStatus,
        next_run: Option<DateTime<Utc>>,
        last_run: Option<DateTime<Utc>>,
    ) -> Result<Job>;
    async fn delete(&self, id: &JobId) -> Result<()>;

    async fn history_append(&self, entry: HistoryEntry) -> Result<HistoryId>;
    async fn history_update(
        &self,
        id: &HistoryId,
        status: HistoryStatus,
        error: Option<String>,
    ) -> Result<()>;
    async fn list_history(&self, filter: ListHistoryFilter) -> Result<Vec<HistoryEntry>>;

    async fn get_setting(&self, key: &str) -> Result<Option<String>>;
    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;
}

/// Outcome of a single send attempt. The three-way split — rather than
/// a plain `Result<(), Error>` — is load-bearing: `unknown` drives a
/// different cadence decision than `failed` (see §4.F).
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Ok,
    Failed(String),
    Unknown(String),
}

/// The external browser-automation collaborator. Calls must be
/// serialised by the caller; this trait makes no promise about
/// concurrent-call safety.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        contact_name: &str,
        message: &str,
        correlation_id: &str,
    ) -> SendOutcome;

    /// Cheap readiness probe. If `false`, the dispatch loop skips the
    /// tick entirely rather than attempting any sends.
    async fn is_ready(&self) -> bool;
}

/// Fire-and-forget outbound signal. A failing `Notifier` must never
/// affect the dispatch loop; implementations should swallow their own
/// errors after logging them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: crate::events::NotifyEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_patch_default_is_all_none() {
        let patch = JobPatch::default();
        assert!(patch.contact_name.is_none());
        assert!(patch.kind.is_none());
    }
}
