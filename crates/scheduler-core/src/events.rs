//! Notifier implementations and the in-process event bus.
//!
//! Fan-out over a small, fixed set of scheduler events, each signed with
//! HMAC-SHA256 before it leaves the process.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::{broadcast, RwLock};

use crate::job::JobId;
use crate::traits::Notifier;

type HmacSha256 = Hmac<Sha256>;

/// One of the four outcomes the Scheduler reports.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifyEvent {
    Sent { job_id: JobId, contact_name: String },
    Failed { job_id: JobId, contact_name: String, reason: String },
    Unknown { job_id: JobId, contact_name: String, reason: String },
    Skipped { job_id: JobId, reason: String },
}

impl NotifyEvent {
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            NotifyEvent::Sent { job_id, .. }
            | NotifyEvent::Failed { job_id, .. }
            | NotifyEvent::Unknown { job_id, .. }
            | NotifyEvent::Skipped { job_id, .. } => Some(job_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotifyEvent::Sent { .. } => "sent",
            NotifyEvent::Failed { .. } => "failed",
            NotifyEvent::Unknown { .. } => "unknown",
            NotifyEvent::Skipped { .. } => "skipped",
        }
    }
}

/// Always-installed notifier: writes a structured log line and never
/// fails. Mirrors the corpus's logging handler, minus anything it would
/// ever print at a level that could leak message bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, event: NotifyEvent) {
        match &event {
            NotifyEvent::Sent { job_id, .. } => {
                tracing::info!(job_id = %job_id, outcome = "sent", "job executed");
            }
            NotifyEvent::Failed { job_id, reason, .. } => {
                tracing::warn!(job_id = %job_id, outcome = "failed", reason = %reason, "job failed");
            }
            NotifyEvent::Unknown { job_id, reason, .. } => {
                tracing::warn!(job_id = %job_id, outcome = "unknown", reason = %reason, "job outcome unknown");
            }
            NotifyEvent::Skipped { job_id, reason } => {
                tracing::info!(job_id = %job_id, outcome = "skipped", reason = %reason, "job skipped");
            }
        }
    }
}

/// Outbound webhook notifier. Payloads are signed with HMAC-SHA256 over
/// a shared secret when one is configured; verification on the
/// receiving end is the deployer's responsibility.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            secret,
        }
    }

    fn sign(&self, payload: &str) -> Option<String> {
        let secret = self.secret.as_ref()?;
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        Some(hex_encode(&mac.finalize().into_bytes()))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: NotifyEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize webhook payload");
                return;
            }
        };

        let mut request = self.client.post(&self.url).body(payload.clone());
        if let Some(signature) = self.sign(&payload) {
            request = request.header("X-Signature-256", format!("sha256={signature}"));
        }

        // Fire-and-forget: a webhook failure must never affect the
        // dispatch loop, so errors are logged and swallowed here.
        if let Err(e) = request.send().await {
            tracing::warn!(error = %e, kind = event.kind(), "webhook notify failed");
        }
    }
}

/// Broadcasts every notify event to any number of subscribers (used by
/// the API adapter to expose a live event feed) while still driving the
/// always-installed logging notifier.
pub struct EventBus {
    tx: broadcast::Sender<NotifyEvent>,
    handlers: RwLock<Vec<std::sync::Arc<dyn Notifier>>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self {
            tx,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotifyEvent> {
        self.tx.subscribe()
    }

    pub async fn register(&self, handler: std::sync::Arc<dyn Notifier>) {
        self.handlers.write().await.push(handler);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl Notifier for EventBus {
    async fn notify(&self, event: NotifyEvent) {
        let _ = self.tx.send(event.clone());
        for handler in self.handlers.read().await.iter() {
            handler.notify(event.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_delivers_to_subscriber_and_handler() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        struct Recorder(std::sync::Arc<tokio::sync::Mutex<Vec<String>>>);
        #[async_trait]
        impl Notifier for Recorder {
            async fn notify(&self, event: NotifyEvent) {
                self.0.lock().await.push(event.kind().to_string());
            }
        }

        let seen = std::sync::Arc::new(tokio::sync::Mutex::new(Vec::new()));
        bus.register(std::sync::Arc::new(Recorder(seen.clone()))).await;

        bus.notify(NotifyEvent::Sent {
            job_id: JobId::new(),
            contact_name: "Alice".into(),
        })
        .await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind(), "sent");
        assert_eq!(seen.lock().await.as_slice(), ["sent"]);
    }

    #[test]
    fn test_webhook_signature_is_deterministic_hmac() {
        let notifier = WebhookNotifier::new("http://example.invalid/hook", Some("secret".into()));
        let sig1 = notifier.sign("payload");
        let sig2 = notifier.sign("payload");
        assert_eq!(sig1, sig2);
        assert!(sig1.unwrap().len() == 64); // hex-encoded SHA-256 digest
    }

    #[test]
    fn test_webhook_no_secret_means_no_signature() {
        let notifier = WebhookNotifier::new("http://example.invalid/hook", None);
        assert!(notifier.sign("payload").is_none());
    }
}
