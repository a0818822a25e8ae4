//! Readiness and liveness snapshots surfaced by the API adapter and the
//! `status` CLI subcommand.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scheduler_core::{MessageSender, SharedMetrics};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessSnapshot {
    pub ready: bool,
    pub timestamp: DateTime<Utc>,
}

/// Queries the real `MessageSender::is_ready` probe. There is no stub
/// path: correctness of the dispatch loop depends on this reflecting
/// the collaborator's actual state.
pub struct HealthChecker {
    sender: Arc<dyn MessageSender>,
    metrics: SharedMetrics,
}

impl HealthChecker {
    pub fn new(sender: Arc<dyn MessageSender>, metrics: SharedMetrics) -> Self {
        Self { sender, metrics }
    }

    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: HealthStatus::Healthy,
            timestamp: Utc::now(),
        }
    }

    pub async fn readiness(&self) -> ReadinessSnapshot {
        ReadinessSnapshot {
            ready: self.sender.is_ready().await,
            timestamp: Utc::now(),
        }
    }

    pub fn metrics(&self) -> SharedMetrics {
        Arc::clone(&self.metrics)
    }
}
