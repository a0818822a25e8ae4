//! Route handlers. Each maps directly onto one `JobStore`/`Scheduler`
//! operation (§6.1); none builds SQL from request input.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use scheduler_core::{Job, JobId, JobKind, JobPatch, JobSpec, JobStatus, ListHistoryFilter};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::AppState;

pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, ApiError> {
    let jobs = state.store.list().await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let id = JobId::from(id);
    let job = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job not found: {}", id.as_str())))?;
    Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub kind: String,
    pub contact_name: String,
    pub message: String,
    pub anchor_time: DateTime<Utc>,
    pub interval_value: Option<u32>,
    pub interval_unit: Option<scheduler_core::IntervalUnit>,
    pub tolerance_minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct InstantSendResponse {
    pub outcome: String,
    pub detail: Option<String>,
}

/// `kind=instant` is handled here rather than as a `JobKind`: it never
/// touches the store and is out of scope of the dispatch loop beyond
/// sharing the sender serialisation invariant (§6.1).
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.kind == "instant" {
        if !state.scheduler.sender_ready().await {
            return Err(ApiError::service_unavailable("message sender is not ready"));
        }
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let outcome = state
            .scheduler
            .send_instant(&req.contact_name, &req.message, &correlation_id)
            .await;
        let body = match outcome {
            scheduler_core::SendOutcome::Ok => InstantSendResponse {
                outcome: "ok".into(),
                detail: None,
            },
            scheduler_core::SendOutcome::Failed(reason) => InstantSendResponse {
                outcome: "failed".into(),
                detail: Some(reason),
            },
            scheduler_core::SendOutcome::Unknown(reason) => InstantSendResponse {
                outcome: "unknown".into(),
                detail: Some(reason),
            },
        };
        return Ok((StatusCode::OK, Json(body)).into_response());
    }

    let kind = match req.kind.as_str() {
        "once" => JobKind::Once,
        "recurring" => JobKind::Recurring,
        other => return Err(ApiError::validation(format!("unknown job kind: {other}"))),
    };

    let spec = JobSpec {
        kind,
        contact_name: req.contact_name,
        message: req.message,
        anchor_time: req.anchor_time,
        interval_value: req.interval_value,
        interval_unit: req.interval_unit,
        tolerance_minutes: req.tolerance_minutes,
    };
    spec.validate()?;

    let job = state.store.create(spec).await?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateJobRequest {
    pub contact_name: Option<String>,
    pub message: Option<String>,
    pub anchor_time: Option<DateTime<Utc>>,
    pub interval_value: Option<u32>,
    pub interval_unit: Option<scheduler_core::IntervalUnit>,
    pub tolerance_minutes: Option<u32>,
    pub kind: Option<String>,
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<Job>, ApiError> {
    let id = JobId::from(id);
    let kind = match req.kind.as_deref() {
        Some("once") => Some(JobKind::Once),
        Some("recurring") => Some(JobKind::Recurring),
        Some(other) => return Err(ApiError::validation(format!("unknown job kind: {other}"))),
        None => None,
    };

    let patch = JobPatch {
        contact_name: req.contact_name,
        message: req.message,
        anchor_time: req.anchor_time,
        interval_value: req.interval_value,
        interval_unit: req.interval_unit,
        tolerance_minutes: req.tolerance_minutes,
        kind,
    };
    let job = state.store.update(&id, patch).await?;
    Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Only `active`/`paused` are caller-reachable transitions (§6.1); the
/// terminal states are dispatcher-owned.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = JobId::from(id);
    let job = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job not found: {}", id.as_str())))?;

    let updated = match req.status.as_str() {
        "paused" => {
            let mut j = job;
            j.pause()?;
            state
                .store
                .set_status(&id, JobStatus::Paused, None, j.last_run)
                .await?
        }
        "active" => {
            let now = Utc::now();
            let next_run = scheduler_core::recurrence::next_slot(&job, now, false);
            let mut j = job;
            j.resume(next_run)?;
            state
                .store
                .set_status(&id, JobStatus::Active, Some(next_run), j.last_run)
                .await?
        }
        other => {
            return Err(ApiError::validation(format!(
                "unsupported status transition: {other}"
            )))
        }
    };

    Ok(Json(StatusResponse {
        status: format!("{:?}", updated.status).to_lowercase(),
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = JobId::from(id);
    state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job not found: {}", id.as_str())))?;
    state.store.delete(&id).await?;
    Ok(Json(DeleteResponse { ok: true }))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListHistoryQuery {
    pub job_id: Option<String>,
    pub limit: Option<usize>,
}

pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<ListHistoryQuery>,
) -> Result<Json<Vec<scheduler_core::HistoryEntry>>, ApiError> {
    let filter = ListHistoryFilter {
        job_id: query.job_id.map(JobId::from),
        limit: query.limit,
    };
    let entries = state.store.list_history(filter).await?;
    Ok(Json(entries))
}

pub async fn health(State(state): State<AppState>) -> Json<scheduler_dispatch::HealthSnapshot> {
    Json(state.health.health())
}

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.health.readiness().await;
    let status = if snapshot.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_job_request_kind_rejects_unknown() {
        let req = UpdateJobRequest {
            kind: Some("bogus".into()),
            ..Default::default()
        };
        assert_eq!(req.kind.as_deref(), Some("bogus"));
    }
}
