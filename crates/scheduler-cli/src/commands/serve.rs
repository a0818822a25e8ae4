//! `serve` composition root.
//!
//! Builds every collaborator exactly once, wires them into a
//! `Scheduler`, spawns the dispatch ticker, and runs the HTTP API
//! until interrupted. No global singletons: everything that needs a
//! collaborator receives an explicit `Arc` handed down from here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use scheduler_api::ApiServer;
use scheduler_core::{
    Clock, Config, EventBus, JobStore, LoggingNotifier, Metrics, Notifier, SystemClock,
    WebhookNotifier,
};
use scheduler_db::SqliteStore;
use scheduler_dispatch::{ExternalMessageSender, HealthChecker, Scheduler};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    database: &str,
    bind: &str,
    api_key: Option<String>,
    sender_url: &str,
    webhook_url: Option<String>,
    webhook_secret: Option<String>,
    tick_interval_secs: u64,
) -> Result<()> {
    let mut config = Config::default();
    config.database_path = database.to_string();
    config.bind_addr = bind.to_string();
    config.api_key = api_key;
    config.tick_interval = Duration::from_secs(tick_interval_secs);

    println!("{}", "Starting message scheduler...".green().bold());
    println!("  Database:  {}", config.database_path.cyan());
    println!("  Listening: {}", config.bind_addr.cyan());
    println!("  Sender:    {}", sender_url.cyan());
    println!(
        "  Auth:      {}",
        if config.auth_required() {
            "API key enabled".yellow()
        } else {
            "none (open access)".red()
        }
    );

    let store: Arc<dyn JobStore> = Arc::new(SqliteStore::open(&config.database_path)?);
    let metrics = Metrics::new();

    let sender = Arc::new(ExternalMessageSender::new(
        sender_url.to_string(),
        Duration::from_secs(scheduler_core::MIN_SEND_TIMEOUT_SECS),
    ));

    let bus = Arc::new(EventBus::new(64));
    bus.register(Arc::new(LoggingNotifier)).await;
    if let Some(url) = webhook_url {
        bus.register(Arc::new(WebhookNotifier::new(url, webhook_secret)))
            .await;
    }
    let notifier: Arc<dyn Notifier> = bus;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&store),
        sender.clone() as Arc<dyn scheduler_core::MessageSender>,
        notifier,
        clock,
        Arc::clone(&metrics),
        config.tick_interval,
    ));

    let ticker = Arc::clone(&scheduler).spawn();

    let health = Arc::new(HealthChecker::new(
        sender as Arc<dyn scheduler_core::MessageSender>,
        Arc::clone(&metrics),
    ));

    let api = ApiServer::new(config, store, Arc::clone(&scheduler), health, metrics);

    tokio::select! {
        result = api.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}", "Shutting down...".yellow());
        }
    }

    scheduler.shutdown();
    let _ = ticker.await;

    Ok(())
}
