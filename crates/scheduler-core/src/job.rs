//! The `Job` entity and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchedulerError;

/// Opaque, stable job identifier (UUID v4 under the hood).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Whether a job fires once or repeats on a fixed cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Once,
    Recurring,
}

/// Fixed-unit recurrence granularity. Deliberately excludes cron
/// expressions in favor of plain intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl IntervalUnit {
    /// Fixed-duration factor for all units except `Month`, which has no
    /// constant length and is handled by iterative calendar arithmetic
    /// in the recurrence module instead.
    pub fn fixed_minutes(self) -> Option<i64> {
        match self {
            IntervalUnit::Minute => Some(1),
            IntervalUnit::Hour => Some(60),
            IntervalUnit::Day => Some(60 * 24),
            IntervalUnit::Week => Some(60 * 24 * 7),
            IntervalUnit::Month => None,
        }
    }
}

/// Lifecycle state. `Pending` exists for forward compatibility but is
/// unused by the standard create flow (every job is born `Active`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Active,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Whether the dispatcher should ever consider a job in this state.
    /// `listDue` only ever returns `Active` jobs; this mirrors that.
    pub fn is_dispatchable(self) -> bool {
        matches!(self, JobStatus::Active)
    }

    pub fn can_transition_to(self, target: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, target),
            (Active, Paused)
                | (Paused, Active)
                | (Active, Completed)
                | (Active, Failed)
                | (Active, Cancelled)
                | (Paused, Cancelled)
                | (Pending, Active)
        )
    }
}

/// A message to be sent once or repeatedly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub contact_name: String,
    pub message: String,
    pub anchor_time: DateTime<Utc>,
    pub interval_value: Option<u32>,
    pub interval_unit: Option<IntervalUnit>,
    pub tolerance_minutes: Option<u32>,
    pub status: JobStatus,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields used to construct a new `Job`. Separate from
/// `Job` itself so the store, not the caller, assigns id/status/nextRun.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSpec {
    pub kind: JobKind,
    pub contact_name: String,
    pub message: String,
    pub anchor_time: DateTime<Utc>,
    pub interval_value: Option<u32>,
    pub interval_unit: Option<IntervalUnit>,
    pub tolerance_minutes: Option<u32>,
}

impl JobSpec {
    /// Field-level validation per §6.1. Returns the first violation found.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.contact_name.trim().is_empty() || self.contact_name.len() > 256 {
            return Err(SchedulerError::validation(
                "contactName must be 1..256 characters",
            ));
        }
        if self.message.is_empty() || self.message.len() > 64 * 1024 {
            return Err(SchedulerError::validation(
                "message must be 1..64KiB",
            ));
        }
        match self.kind {
            JobKind::Recurring => {
                let value = self.interval_value.ok_or_else(|| {
                    SchedulerError::validation("intervalValue is required for recurring jobs")
                })?;
                if value == 0 {
                    return Err(SchedulerError::validation("intervalValue must be >= 1"));
                }
                if self.interval_unit.is_none() {
                    return Err(SchedulerError::validation(
                        "intervalUnit is required for recurring jobs",
                    ));
                }
            }
            JobKind::Once => {
                if self.interval_value.is_some() || self.interval_unit.is_some() {
                    return Err(SchedulerError::validation(
                        "intervalValue/intervalUnit must be absent for once jobs",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Job {
    /// Build a fresh `Active` job from a validated spec. The `anchorTime`
    /// is truncated to minute resolution per §3.1; `nextRun` starts at
    /// the anchor for both kinds (the dispatcher's recurrence function
    /// advances it from there).
    pub fn from_spec(id: JobId, spec: JobSpec, created_at: DateTime<Utc>) -> Self {
        let anchor = crate::clock::truncate_to_minute(spec.anchor_time);
        Self {
            id,
            kind: spec.kind,
            contact_name: spec.contact_name,
            message: spec.message,
            anchor_time: anchor,
            interval_value: spec.interval_value,
            interval_unit: spec.interval_unit,
            tolerance_minutes: spec.tolerance_minutes,
            status: JobStatus::Active,
            next_run: Some(anchor),
            last_run: None,
            created_at,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.status.is_dispatchable() {
            return false;
        }
        match self.kind {
            JobKind::Once => self.anchor_time <= now,
            JobKind::Recurring => self.next_run.map(|n| n <= now).unwrap_or(false),
        }
    }

    pub fn pause(&mut self) -> Result<(), SchedulerError> {
        if !self.status.can_transition_to(JobStatus::Paused) {
            return Err(SchedulerError::validation(format!(
                "cannot pause a job in status {:?}",
                self.status
            )));
        }
        self.status = JobStatus::Paused;
        self.next_run = None;
        Ok(())
    }

    pub fn resume(&mut self, next_run: DateTime<Utc>) -> Result<(), SchedulerError> {
        if !self.status.can_transition_to(JobStatus::Active) {
            return Err(SchedulerError::validation(format!(
                "cannot resume a job in status {:?}",
                self.status
            )));
        }
        self.status = JobStatus::Active;
        self.next_run = Some(next_run);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec(kind: JobKind) -> JobSpec {
        JobSpec {
            kind,
            contact_name: "Alice".into(),
            message: "hi".into(),
            anchor_time: Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap(),
            interval_value: if kind == JobKind::Recurring { Some(1) } else { None },
            interval_unit: if kind == JobKind::Recurring { Some(IntervalUnit::Hour) } else { None },
            tolerance_minutes: None,
        }
    }

    #[test]
    fn test_validate_once_rejects_interval_fields() {
        let mut s = spec(JobKind::Once);
        s.interval_value = Some(1);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_recurring_requires_interval() {
        let mut s = spec(JobKind::Recurring);
        s.interval_value = None;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_empty_contact_rejected() {
        let mut s = spec(JobKind::Once);
        s.contact_name = "".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_from_spec_sets_next_run_to_anchor() {
        let s = spec(JobKind::Recurring);
        let job = Job::from_spec(JobId::new(), s.clone(), Utc::now());
        assert_eq!(job.next_run, Some(s.anchor_time));
        assert_eq!(job.status, JobStatus::Active);
    }

    #[test]
    fn test_pause_clears_next_run() {
        let s = spec(JobKind::Recurring);
        let mut job = Job::from_spec(JobId::new(), s, Utc::now());
        job.pause().unwrap();
        assert_eq!(job.status, JobStatus::Paused);
        assert!(job.next_run.is_none());
    }

    #[test]
    fn test_resume_requires_paused() {
        let s = spec(JobKind::Recurring);
        let mut job = Job::from_spec(JobId::new(), s, Utc::now());
        assert!(job.resume(Utc::now()).is_err());
        job.pause().unwrap();
        assert!(job.resume(Utc::now()).is_ok());
        assert_eq!(job.status, JobStatus::Active);
    }

    #[test]
    fn test_is_due_once() {
        let s = spec(JobKind::Once);
        let job = Job::from_spec(JobId::new(), s.clone(), Utc::now());
        assert!(job.is_due(s.anchor_time));
        assert!(!job.is_due(s.anchor_time - chrono::Duration::minutes(1)));
    }

    #[test]
    fn test_is_due_false_when_paused() {
        let s = spec(JobKind::Recurring);
        let mut job = Job::from_spec(JobId::new(), s.clone(), Utc::now());
        job.pause().unwrap();
        assert!(!job.is_due(s.anchor_time));
    }

    #[test]
    fn test_job_id_roundtrip() {
        let id = JobId::new();
        let back = JobId::from(id.to_string());
        assert_eq!(id, back);
    }

    #[test]
    fn test_can_transition_to() {
        assert!(JobStatus::Active.can_transition_to(JobStatus::Paused));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Active));
    }
}
