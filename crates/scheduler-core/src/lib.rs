//! Message scheduler core
//!
//! Types, traits, and pure algorithms shared by the dispatch loop, the
//! storage layer, and the HTTP adapter.
//!
//! ```text
//!   API Adapter ──> Scheduler ──> JobStore
//!                       │
//!                       ├──> Recurrence (pure)
//!                       ├──> Notifier (fire-and-forget)
//!                       └──> MessageSender (serialised, external)
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod job;
pub mod metrics;
pub mod recurrence;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorCode, SchedulerError};
pub use events::{EventBus, LoggingNotifier, NotifyEvent, WebhookNotifier};
pub use history::{HistoryEntry, HistoryId, HistoryStatus};
pub use job::{IntervalUnit, Job, JobId, JobKind, JobSpec, JobStatus};
pub use config::{Config, ConfigError};
pub use metrics::{Metrics, SharedMetrics};
pub use traits::{JobPatch, JobStore, ListHistoryFilter, MessageSender, Notifier, SendOutcome};

/// Crate version, surfaced on `status`/`health` responses.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lower bound on the external sender's internal timeout.
pub const MIN_SEND_TIMEOUT_SECS: u64 = 20;

pub type Result<T> = std::result::Result<T, SchedulerError>;
