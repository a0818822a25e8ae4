//! Error taxonomy.
//!
//! Every variant maps to one of a small set of stable identifiers that
//! appear verbatim in API responses, history rows, and logs.

use thiserror::Error;

/// Stable, lowercase-hyphenated identifiers. `Display` renders exactly
/// the string the API and history rows are expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Validation,
    NotReady,
    SkippedLate,
    SendFailed,
    SendUnknown,
    StoreError,
    Internal,
    /// Ambient extension for the HTTP adapter's 404s; not one of the
    /// dispatch-loop taxonomy identifiers but needed to answer API calls.
    NotFound,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::Validation => "validation",
            ErrorCode::NotReady => "not-ready",
            ErrorCode::SkippedLate => "skipped-late",
            ErrorCode::SendFailed => "send-failed",
            ErrorCode::SendUnknown => "send-unknown",
            ErrorCode::StoreError => "store-error",
            ErrorCode::Internal => "internal",
            ErrorCode::NotFound => "not-found",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("job not found: {id}")]
    JobNotFound { id: String },

    #[error("sender not ready")]
    NotReady,

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Stable identifier for this error, used in API responses and logs.
    /// Never includes the underlying message text, which may carry
    /// implementation detail not meant for API consumers.
    pub fn code(&self) -> ErrorCode {
        match self {
            SchedulerError::Validation(_) => ErrorCode::Validation,
            SchedulerError::JobNotFound { .. } => ErrorCode::NotFound,
            SchedulerError::NotReady => ErrorCode::NotReady,
            SchedulerError::Store(_) => ErrorCode::StoreError,
            SchedulerError::Serialization(_) => ErrorCode::Internal,
            SchedulerError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// A message safe to return to an API caller: no SQL text, no
    /// internal `Display` chains, no file paths.
    pub fn public_message(&self) -> String {
        match self {
            SchedulerError::Validation(m) => m.clone(),
            SchedulerError::JobNotFound { id } => format!("job not found: {id}"),
            SchedulerError::NotReady => "message sender is not ready".to_string(),
            SchedulerError::Store(_) => "a storage error occurred".to_string(),
            SchedulerError::Serialization(_) => "an internal error occurred".to_string(),
            SchedulerError::Internal(_) => "an internal error occurred".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::SkippedLate.to_string(), "skipped-late");
        assert_eq!(ErrorCode::SendUnknown.to_string(), "send-unknown");
    }

    #[test]
    fn test_store_error_hides_detail() {
        let err = SchedulerError::store("duplicate key: jobs.id = 'x' at query SELECT * FROM jobs");
        assert_eq!(err.code(), ErrorCode::StoreError);
        assert_eq!(err.public_message(), "a storage error occurred");
    }

    #[test]
    fn test_job_not_found_message_is_safe() {
        let err = SchedulerError::JobNotFound { id: "abc123".into() };
        assert!(err.public_message().contains("abc123"));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
