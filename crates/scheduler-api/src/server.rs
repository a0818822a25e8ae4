//! HTTP API composition: router, shared state, and the adapter's
//! CORS/auth/tracing layers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use scheduler_core::{Config, SharedMetrics};
use scheduler_core::JobStore;
use scheduler_dispatch::{HealthChecker, Scheduler};

use crate::middleware::{AuthLayer, RequestLogger};
use crate::routes;

/// State shared across every handler. `Clone` is cheap: every field is
/// an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub scheduler: Arc<Scheduler>,
    pub health: Arc<HealthChecker>,
    pub metrics: SharedMetrics,
}

pub struct ApiServer {
    config: Config,
    state: AppState,
}

impl ApiServer {
    pub fn new(
        config: Config,
        store: Arc<dyn JobStore>,
        scheduler: Arc<Scheduler>,
        health: Arc<HealthChecker>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            config,
            state: AppState {
                store,
                scheduler,
                health,
                metrics,
            },
        }
    }

    /// Build the router. An empty `cors_allowed_origins` means
    /// same-origin only: there is no wildcard fallback (§6.1).
    pub fn router(&self) -> Router {
        let cors = if self.config.cors_allowed_origins.is_empty() {
            CorsLayer::new()
        } else {
            let origins: Vec<_> = self
                .config
                .cors_allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        };

        Router::new()
            .route("/jobs", get(routes::list_jobs).post(routes::create_job))
            .route("/jobs/:id", get(routes::get_job))
            .route("/jobs/:id", patch(routes::update_job))
            .route("/jobs/:id", delete(routes::delete_job))
            .route("/jobs/:id/status", post(routes::set_status))
            .route("/history", get(routes::list_history))
            .route("/health", get(routes::health))
            .route("/ready", get(routes::readiness))
            .route("/metrics", get(routes::metrics))
            .layer(AuthLayer::new(self.config.api_key.clone()))
            .layer(RequestLogger::new())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_addr
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e}")))?;

        let router = self.router();
        tracing::info!(address = %addr, "starting API server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_core::{Clock, Metrics, NotifyEvent, SendOutcome, SystemClock};
    use scheduler_db::SqliteStore;
    use std::time::Duration;

    struct NullNotifier;
    #[async_trait::async_trait]
    impl scheduler_core::Notifier for NullNotifier {
        async fn notify(&self, _event: NotifyEvent) {}
    }

    struct AlwaysReady;
    #[async_trait::async_trait]
    impl scheduler_core::MessageSender for AlwaysReady {
        async fn send(&self, _: &str, _: &str, _: &str) -> SendOutcome {
            SendOutcome::Ok
        }
        async fn is_ready(&self) -> bool {
            true
        }
    }

    fn build_server() -> ApiServer {
        let config = Config::default();
        let store: Arc<dyn JobStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let metrics = Metrics::new();
        let sender: Arc<dyn scheduler_core::MessageSender> = Arc::new(AlwaysReady);
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&store),
            Arc::clone(&sender),
            Arc::new(NullNotifier),
            Arc::new(SystemClock) as Arc<dyn Clock>,
            Arc::clone(&metrics),
            Duration::from_secs(60),
        ));
        let health = Arc::new(HealthChecker::new(sender, Arc::clone(&metrics)));
        ApiServer::new(config, store, scheduler, health, metrics)
    }

    #[test]
    fn test_router_builds_without_panicking() {
        let server = build_server();
        let _router = server.router();
    }
}
