//! The dispatch loop and its external collaborators.
//!
//! ```text
//!   Scheduler::tick()
//!       ├─ JobStore::list_due(now)
//!       ├─ Recurrence::next_slot (pure, in scheduler-core)
//!       ├─ MessageSender::send (serialised via send_lock)
//!       └─ Notifier::notify
//! ```

pub mod health;
pub mod scheduler;
pub mod sender;

pub use health::{HealthChecker, HealthSnapshot, HealthStatus, ReadinessSnapshot};
pub use scheduler::{Scheduler, SchedulerState};
pub use sender::{ExternalMessageSender, RecordingMessageSender};
