//! `MessageSender` implementations.
//!
//! The production sender's concrete transport (browser automation,
//! a messaging-platform API, whatever actually delivers the message) is
//! intentionally out of this crate's scope; `ExternalMessageSender`
//! below is a thin HTTP adapter over a locally-run delivery service,
//! wired in at composition-root time with its own URL. Tests use
//! `RecordingMessageSender` to script deterministic outcome sequences.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use scheduler_core::{MessageSender, SendOutcome};

/// Talks to a local delivery service over HTTP. `send` and `is_ready`
/// both respect the sender's own internal timeout; the Scheduler places
/// no additional wall-clock bound around either call.
pub struct ExternalMessageSender {
    client: reqwest::Client,
    base_url: String,
}

impl ExternalMessageSender {
    pub fn new(base_url: impl Into<String>, send_timeout: Duration) -> Self {
        let timeout = send_timeout.max(Duration::from_secs(scheduler_core::MIN_SEND_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client configuration is valid");
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(serde::Serialize)]
struct SendRequest<'a> {
    contact_name: &'a str,
    message: &'a str,
    correlation_id: &'a str,
}

#[derive(serde::Deserialize)]
struct SendResponse {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait]
impl MessageSender for ExternalMessageSender {
    async fn send(&self, contact_name: &str, message: &str, correlation_id: &str) -> SendOutcome {
        let url = format!("{}/send", self.base_url);
        let body = SendRequest {
            contact_name,
            message,
            correlation_id,
        };

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return SendOutcome::Unknown("send timed out".into());
            }
            Err(e) => return SendOutcome::Failed(e.to_string()),
        };

        if !response.status().is_success() {
            return SendOutcome::Failed(format!("transport rejected: {}", response.status()));
        }

        match response.json::<SendResponse>().await {
            Ok(parsed) => match parsed.status.as_str() {
                "ok" => SendOutcome::Ok,
                "failed" => SendOutcome::Failed(parsed.reason.unwrap_or_else(|| "failed".into())),
                _ => SendOutcome::Unknown(parsed.reason.unwrap_or_else(|| "unrecognised status".into())),
            },
            Err(e) => SendOutcome::Unknown(format!("could not parse response: {e}")),
        }
    }

    async fn is_ready(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Deterministic stand-in for tests: pops a scripted sequence of
/// outcomes, defaulting to `Ok` once the script is exhausted.
pub struct RecordingMessageSender {
    script: Mutex<VecDeque<SendOutcome>>,
    ready: AtomicBool,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingMessageSender {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            ready: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = SendOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            ready: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub async fn push_outcome(&self, outcome: SendOutcome) {
        self.script.lock().await.push_back(outcome);
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for RecordingMessageSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSender for RecordingMessageSender {
    async fn send(&self, contact_name: &str, message: &str, _correlation_id: &str) -> SendOutcome {
        self.calls
            .lock()
            .await
            .push((contact_name.to_string(), message.to_string()));
        let mut script = self.script.lock().await;
        script.pop_front().unwrap_or(SendOutcome::Ok)
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sender_plays_back_script_in_order() {
        let sender = RecordingMessageSender::with_outcomes([
            SendOutcome::Ok,
            SendOutcome::Failed("nope".into()),
        ]);
        assert!(matches!(sender.send("a", "m", "1").await, SendOutcome::Ok));
        assert!(matches!(
            sender.send("a", "m", "2").await,
            SendOutcome::Failed(_)
        ));
        assert!(matches!(sender.send("a", "m", "3").await, SendOutcome::Ok));
        assert_eq!(sender.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_recording_sender_not_ready() {
        let sender = RecordingMessageSender::new();
        sender.set_ready(false);
        assert!(!sender.is_ready().await);
    }
}
