//! Append-only execution history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::{JobId, JobKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(String);

impl HistoryId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HistoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// `Sending` is the transient state written before `MessageSender` is
/// invoked; every other variant is terminal and written exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Sending,
    Sent,
    Failed,
    Unknown,
    Skipped,
}

impl HistoryStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, HistoryStatus::Sending)
    }
}

/// A single execution attempt, snapshotting the job fields at the time
/// of the attempt so later edits to the job never retroactively change
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub job_id: Option<JobId>,
    pub kind: JobKind,
    pub contact_name: String,
    pub message: String,
    pub status: HistoryStatus,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn new_sending(
        id: HistoryId,
        job_id: Option<JobId>,
        kind: JobKind,
        contact_name: String,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            job_id,
            kind,
            contact_name,
            message,
            status: HistoryStatus::Sending,
            timestamp,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sending_is_not_terminal() {
        assert!(!HistoryStatus::Sending.is_terminal());
        assert!(HistoryStatus::Sent.is_terminal());
        assert!(HistoryStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_new_sending_entry_has_no_error() {
        let entry = HistoryEntry::new_sending(
            HistoryId::new(),
            Some(JobId::new()),
            JobKind::Once,
            "Alice".into(),
            "hi".into(),
            Utc::now(),
        );
        assert_eq!(entry.status, HistoryStatus::Sending);
        assert!(entry.error.is_none());
    }
}
