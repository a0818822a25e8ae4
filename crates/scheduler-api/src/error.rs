//! Maps `SchedulerError` onto HTTP responses.
//!
//! Every response body carries the stable taxonomy identifier from
//! `scheduler_core::ErrorCode` plus a short human message; never a raw
//! SQL fragment, a `Display` of an internal error, or reflected
//! unescaped request input (§6.1).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scheduler_core::{ErrorCode, SchedulerError};
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::Validation, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Validation,
            "missing or invalid API key",
        )
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, ErrorCode::NotReady, message)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        let status = match err.code() {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::SkippedLate
            | ErrorCode::SendFailed
            | ErrorCode::SendUnknown
            | ErrorCode::StoreError
            | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.code(), err.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_not_found_maps_to_404() {
        let err: ApiError = SchedulerError::JobNotFound { id: "x".into() }.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_error_never_leaks_detail_into_message() {
        let err: ApiError =
            SchedulerError::store("duplicate key: jobs.id = 'x' at SELECT * FROM jobs").into();
        assert!(!err.message.contains("SELECT"));
    }
}
