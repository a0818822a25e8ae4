//! The dispatch engine: tick loop, due-selection, tolerance policy,
//! execution state, and history emission.
//!
//! Grounded in the same `tokio::time::interval` + `Arc<RwLock<bool>>`
//! run-flag shape this codebase's ancestry uses for its scheduler
//! thread, but replacing the binary-heap of scheduled entries with a
//! direct poll of `JobStore::list_due` each tick: the store, not an
//! in-memory queue, is the source of truth for "what's due", so a
//! process restart never loses a slot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::interval;

use scheduler_core::{
    Clock, HistoryEntry, HistoryId, HistoryStatus, Job, JobId, JobKind, JobStatus, JobStore,
    MessageSender, Notifier, NotifyEvent, SendOutcome, SharedMetrics,
};
use scheduler_core::recurrence::next_slot;

/// Runtime state of the dispatch loop, surfaced on `status`/`health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// The dispatch engine. Holds no job data itself: every tick re-reads
/// `JobStore` so an in-memory `Job` is never stale across ticks.
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    sender: Arc<dyn MessageSender>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    metrics: SharedMetrics,
    tick_interval: Duration,

    /// At-most-one-concurrent-attempt-per-job enforcement (§5.1).
    executing: Arc<Mutex<HashSet<JobId>>>,
    /// Serialises calls into the single-threaded external sender (§5.2),
    /// independent of `executing`: this is belt-and-braces against any
    /// future parallelisation of the tick loop itself.
    send_lock: Arc<Mutex<()>>,

    state: Arc<RwLock<SchedulerState>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        sender: Arc<dyn MessageSender>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        metrics: SharedMetrics,
        tick_interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            store,
            sender,
            notifier,
            clock,
            metrics,
            tick_interval,
            executing: Arc::new(Mutex::new(HashSet::new())),
            send_lock: Arc::new(Mutex::new(())),
            state: Arc::new(RwLock::new(SchedulerState::Idle)),
            shutdown_tx,
        }
    }

    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    /// Number of jobs presently mid-attempt. Exposed for `status` and
    /// for tests asserting the at-most-one invariant (§8.1).
    pub async fn executing_count(&self) -> usize {
        self.executing.lock().await.len()
    }

    /// Spawn the ticker as a background task and return immediately.
    /// The returned `JoinHandle` resolves once `shutdown` is called.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            {
                let mut state = self.state.write().await;
                *state = SchedulerState::Running;
            }
            let mut ticker = interval(self.tick_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
            let mut state = self.state.write().await;
            *state = SchedulerState::Stopped;
        })
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub async fn sender_ready(&self) -> bool {
        self.sender.is_ready().await
    }

    /// Send a message immediately, bypassing the job store entirely
    /// (§6.1's `kind=instant` adapter request). Still serialised through
    /// the same sender lock as every scheduled send: the external
    /// collaborator has exactly one caller path at a time regardless of
    /// whether the call originated from a tick or an API request.
    pub async fn send_instant(&self, contact_name: &str, message: &str, correlation_id: &str) -> SendOutcome {
        let _permit = self.send_lock.lock().await;
        self.sender.send(contact_name, message, correlation_id).await
    }

    /// One iteration of the dispatch loop (§4.F). Public so the CLI's
    /// one-shot `worker` mode and tests can drive it directly without
    /// waiting on the real clock.
    pub async fn tick(&self) {
        self.metrics.record_tick();

        if !self.sender.is_ready().await {
            tracing::debug!("message sender not ready, skipping tick");
            return;
        }

        let now = self.clock.truncate_to_minute(self.clock.now_utc());
        tracing::debug!(now = %now, "tick start");

        let due = match self.store.list_due(now).await {
            Ok(jobs) => jobs,
            Err(e) => {
                self.metrics.record_store_error();
                tracing::error!(error = %e, "failed to list due jobs, aborting tick");
                return;
            }
        };

        for job in due {
            self.dispatch_one(job, now).await;
        }

        tracing::debug!(now = %now, "tick end");
    }

    /// Steps 4.a-4.c of the dispatch loop for a single due job.
    async fn dispatch_one(&self, job: Job, now: chrono::DateTime<Utc>) {
        {
            let executing = self.executing.lock().await;
            if executing.contains(&job.id) {
                tracing::debug!(job_id = %job.id, "job already executing, skipping");
                return;
            }
        }

        if job.kind == JobKind::Recurring {
            if let Some(tolerance) = job.tolerance_minutes {
                let Some(scheduled) = job.next_run else {
                    return;
                };
                let late = (now - scheduled).num_minutes().max(0);
                if late > tolerance as i64 {
                    match self.skip_late(&job, now, late).await {
                        Ok(Some(reevaluated)) => {
                            self.run_job(reevaluated, now).await;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            self.metrics.record_store_error();
                            tracing::error!(job_id = %job.id, error = %e, "store error while skipping late job");
                        }
                    }
                    return;
                }
            }
        }

        self.run_job(job, now).await;
    }

    /// §4.F step (b): record the skip, advance `nextRun`, and
    /// re-evaluate once. Returns the refreshed job if the new slot
    /// itself falls within tolerance (fall through to execution).
    async fn skip_late(
        &self,
        job: &Job,
        now: chrono::DateTime<Utc>,
        late: i64,
    ) -> scheduler_core::Result<Option<Job>> {
        let entry = HistoryEntry {
            id: HistoryId::new(),
            job_id: Some(job.id.clone()),
            kind: job.kind,
            contact_name: job.contact_name.clone(),
            message: job.message.clone(),
            status: HistoryStatus::Skipped,
            timestamp: now,
            error: Some(format!("Late by {late}m")),
        };
        self.store.history_append(entry).await?;
        self.metrics.record_skipped();

        let new_next_run = next_slot(job, now, false);
        let updated = self
            .store
            .set_status(&job.id, job.status, Some(new_next_run), None)
            .await?;

        self.notifier
            .notify(NotifyEvent::Skipped {
                job_id: job.id.clone(),
                reason: format!("Late by {late}m"),
            })
            .await;

        let tolerance = job.tolerance_minutes.unwrap_or(0) as i64;
        if new_next_run <= now && (now - new_next_run).num_minutes() < tolerance {
            Ok(Some(updated))
        } else {
            Ok(None)
        }
    }

    /// §4.F `runJob`: claims the job id, serialises the send, and
    /// advances cadence based on the three-way outcome.
    async fn run_job(&self, job: Job, now: chrono::DateTime<Utc>) {
        {
            let mut executing = self.executing.lock().await;
            if !executing.insert(job.id.clone()) {
                return;
            }
        }

        let result = self.run_job_inner(&job, now).await;
        if let Err(e) = result {
            self.metrics.record_store_error();
            tracing::error!(job_id = %job.id, error = %e, "store error during job execution");
        }

        self.executing.lock().await.remove(&job.id);
    }

    async fn run_job_inner(&self, job: &Job, now: chrono::DateTime<Utc>) -> scheduler_core::Result<()> {
        let entry = HistoryEntry::new_sending(
            HistoryId::new(),
            Some(job.id.clone()),
            job.kind,
            job.contact_name.clone(),
            job.message.clone(),
            now,
        );
        let hid = self.store.history_append(entry).await?;

        let outcome = {
            let _permit = self.send_lock.lock().await;
            self.sender
                .send(&job.contact_name, &job.message, hid.as_str())
                .await
        };

        match outcome {
            SendOutcome::Ok => {
                let next_run = match job.kind {
                    JobKind::Once => None,
                    JobKind::Recurring => Some(next_slot(job, now, true)),
                };
                let status = match job.kind {
                    JobKind::Once => JobStatus::Completed,
                    JobKind::Recurring => JobStatus::Active,
                };
                self.store
                    .set_status(&job.id, status, next_run, Some(now))
                    .await?;
                self.store.history_update(&hid, HistoryStatus::Sent, None).await?;
                self.metrics.record_sent();
                self.notifier
                    .notify(NotifyEvent::Sent {
                        job_id: job.id.clone(),
                        contact_name: job.contact_name.clone(),
                    })
                    .await;
                tracing::info!(job_id = %job.id, outcome = "sent", "job executed");
            }
            SendOutcome::Failed(reason) => {
                let (status, next_run) = match job.kind {
                    JobKind::Once => (JobStatus::Failed, None),
                    JobKind::Recurring => (JobStatus::Active, Some(next_slot(job, now, false))),
                };
                self.store
                    .set_status(&job.id, status, next_run, Some(now))
                    .await?;
                self.store
                    .history_update(&hid, HistoryStatus::Failed, Some(reason.clone()))
                    .await?;
                self.metrics.record_failed();
                self.notifier
                    .notify(NotifyEvent::Failed {
                        job_id: job.id.clone(),
                        contact_name: job.contact_name.clone(),
                        reason: reason.clone(),
                    })
                    .await;
                tracing::warn!(job_id = %job.id, outcome = "failed", reason = %reason, "job failed");
            }
            SendOutcome::Unknown(reason) => {
                let next_run = match job.kind {
                    JobKind::Once => None,
                    JobKind::Recurring => Some(next_slot(job, now, true)),
                };
                let status = match job.kind {
                    JobKind::Once => JobStatus::Completed,
                    JobKind::Recurring => JobStatus::Active,
                };
                self.store
                    .set_status(&job.id, status, next_run, Some(now))
                    .await?;
                self.store
                    .history_update(&hid, HistoryStatus::Unknown, Some(reason.clone()))
                    .await?;
                self.metrics.record_unknown();
                self.notifier
                    .notify(NotifyEvent::Unknown {
                        job_id: job.id.clone(),
                        contact_name: job.contact_name.clone(),
                        reason: reason.clone(),
                    })
                    .await;
                tracing::warn!(job_id = %job.id, outcome = "unknown", reason = %reason, "job outcome unknown");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scheduler_core::{
        IntervalUnit, JobSpec, ListHistoryFilter, Metrics, SystemClock,
    };
    use scheduler_db::SqliteStore;

    use crate::sender::RecordingMessageSender;

    struct NullNotifier;
    #[async_trait::async_trait]
    impl Notifier for NullNotifier {
        async fn notify(&self, _event: NotifyEvent) {}
    }

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    struct ManualClock(chrono::DateTime<Utc>);
    impl Clock for ManualClock {
        fn now_utc(&self) -> chrono::DateTime<Utc> {
            self.0
        }
    }

    async fn harness(
        now: chrono::DateTime<Utc>,
        sender: RecordingMessageSender,
    ) -> (Scheduler, Arc<dyn JobStore>) {
        let store: Arc<dyn JobStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let scheduler = Scheduler::new(
            Arc::clone(&store),
            Arc::new(sender),
            Arc::new(NullNotifier),
            Arc::new(ManualClock(now)),
            Metrics::new(),
            Duration::from_secs(60),
        );
        (scheduler, store)
    }

    #[tokio::test]
    async fn test_scenario_1_catch_up_within_tolerance() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let now = dt(2025, 1, 1, 11, 5);
        let (scheduler, store) = harness(now, RecordingMessageSender::new()).await;

        let job = store
            .create(JobSpec {
                kind: JobKind::Recurring,
                contact_name: "Alice".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: Some(1),
                interval_unit: Some(IntervalUnit::Hour),
                tolerance_minutes: Some(10),
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let refreshed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(refreshed.next_run, Some(dt(2025, 1, 1, 12, 0)));

        let history = store
            .list_history(ListHistoryFilter { job_id: Some(job.id), limit: None })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, HistoryStatus::Sent);
    }

    #[tokio::test]
    async fn test_scenario_2_skipped_slot() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let now = dt(2025, 1, 1, 11, 20);
        let (scheduler, store) = harness(now, RecordingMessageSender::new()).await;

        let job = store
            .create(JobSpec {
                kind: JobKind::Recurring,
                contact_name: "Alice".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: Some(1),
                interval_unit: Some(IntervalUnit::Hour),
                tolerance_minutes: Some(10),
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let refreshed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(refreshed.next_run, Some(dt(2025, 1, 1, 12, 0)));

        let history = store
            .list_history(ListHistoryFilter { job_id: Some(job.id), limit: None })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, HistoryStatus::Skipped);
    }

    #[tokio::test]
    async fn test_scenario_3_skip_then_execute_in_one_tick() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let now = dt(2025, 1, 1, 12, 3);
        let (scheduler, store) = harness(now, RecordingMessageSender::new()).await;

        let job = store
            .create(JobSpec {
                kind: JobKind::Recurring,
                contact_name: "Alice".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: Some(1),
                interval_unit: Some(IntervalUnit::Hour),
                tolerance_minutes: Some(10),
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let refreshed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(refreshed.next_run, Some(dt(2025, 1, 1, 13, 0)));

        let history = store
            .list_history(ListHistoryFilter { job_id: Some(job.id), limit: None })
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().any(|h| h.status == HistoryStatus::Skipped));
        assert!(history.iter().any(|h| h.status == HistoryStatus::Sent));
    }

    #[tokio::test]
    async fn test_scenario_4_unknown_does_not_retry() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let now = anchor;
        let (scheduler, store) = harness(
            now,
            RecordingMessageSender::with_outcomes([SendOutcome::Unknown("timeout".into())]),
        )
        .await;

        let job = store
            .create(JobSpec {
                kind: JobKind::Recurring,
                contact_name: "Alice".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: Some(1),
                interval_unit: Some(IntervalUnit::Hour),
                tolerance_minutes: Some(30),
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let refreshed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(refreshed.next_run, Some(dt(2025, 1, 1, 11, 0)));

        let history = store
            .list_history(ListHistoryFilter { job_id: Some(job.id), limit: None })
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, HistoryStatus::Unknown);
    }

    #[tokio::test]
    async fn test_once_job_in_the_past_completes() {
        let anchor = dt(2025, 1, 1, 9, 55);
        let now = dt(2025, 1, 1, 10, 0);
        let (scheduler, store) = harness(now, RecordingMessageSender::new()).await;

        let job = store
            .create(JobSpec {
                kind: JobKind::Once,
                contact_name: "Bob".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: None,
                interval_unit: None,
                tolerance_minutes: None,
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let refreshed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(refreshed.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_once_job_marks_failed() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let (scheduler, store) = harness(
            anchor,
            RecordingMessageSender::with_outcomes([SendOutcome::Failed("no contact".into())]),
        )
        .await;

        let job = store
            .create(JobSpec {
                kind: JobKind::Once,
                contact_name: "Ghost".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: None,
                interval_unit: None,
                tolerance_minutes: None,
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let refreshed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(refreshed.status, JobStatus::Failed);

        let history = store
            .list_history(ListHistoryFilter { job_id: Some(job.id), limit: None })
            .await
            .unwrap();
        assert_eq!(history[0].status, HistoryStatus::Failed);
    }

    #[tokio::test]
    async fn test_failed_recurring_job_retries_in_current_slot() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let (scheduler, store) = harness(
            anchor,
            RecordingMessageSender::with_outcomes([SendOutcome::Failed("transient".into())]),
        )
        .await;

        let job = store
            .create(JobSpec {
                kind: JobKind::Recurring,
                contact_name: "Alice".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: Some(1),
                interval_unit: Some(IntervalUnit::Hour),
                tolerance_minutes: None,
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let refreshed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(refreshed.next_run, Some(anchor));
        assert_eq!(refreshed.status, JobStatus::Active);
    }

    #[tokio::test]
    async fn test_not_ready_sender_skips_tick_entirely() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let sender = RecordingMessageSender::new();
        sender.set_ready(false);
        let (scheduler, store) = harness(anchor, sender).await;

        store
            .create(JobSpec {
                kind: JobKind::Once,
                contact_name: "Alice".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: None,
                interval_unit: None,
                tolerance_minutes: None,
            })
            .await
            .unwrap();

        scheduler.tick().await;

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Active);
        let history = store
            .list_history(ListHistoryFilter::default())
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_executing_set_prevents_double_dispatch() {
        let anchor = dt(2025, 1, 1, 10, 0);
        let (scheduler, store) = harness(anchor, RecordingMessageSender::new()).await;
        let job = store
            .create(JobSpec {
                kind: JobKind::Once,
                contact_name: "Alice".into(),
                message: "hi".into(),
                anchor_time: anchor,
                interval_value: None,
                interval_unit: None,
                tolerance_minutes: None,
            })
            .await
            .unwrap();

        let scheduler = Arc::new(scheduler);
        let now = anchor;
        let (a, b) = tokio::join!(
            scheduler.dispatch_one(job.clone(), now),
            scheduler.dispatch_one(job.clone(), now)
        );
        let _ = (a, b);

        let history = store
            .list_history(ListHistoryFilter { job_id: Some(job.id), limit: None })
            .await
            .unwrap();
        assert_eq!(history.len(), 1, "exactly one attempt despite overlapping dispatch");
    }
}
