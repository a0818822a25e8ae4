//! HTTP API adapter.
//!
//! Translates job/history CRUD and health/metrics routes into
//! `Scheduler`/`JobStore` operations. Every response body carries only
//! the stable taxonomy identifiers of `scheduler_core::ErrorCode`; no
//! handler builds SQL from request input or reflects unescaped input
//! back to the caller.
//!
//! # Endpoints
//!
//! - `GET /jobs` - list jobs, reverse creation order
//! - `POST /jobs` - create a job (or, with `kind: "instant"`, bypass
//!   the store entirely and send immediately)
//! - `GET /jobs/:id` - fetch one job
//! - `PATCH /jobs/:id` - partial update
//! - `POST /jobs/:id/status` - transition to `active`/`paused`
//! - `DELETE /jobs/:id` - remove a job and cascade its history
//! - `GET /history` - list history entries, newest first
//! - `GET /health` - liveness
//! - `GET /ready` - readiness (mirrors `MessageSender::is_ready`)
//! - `GET /metrics` - Prometheus text exposition

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, ApiServer};
