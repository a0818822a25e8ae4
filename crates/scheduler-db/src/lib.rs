//! Embedded SQLite-backed `JobStore`.
//!
//! A single `rusqlite::Connection` behind a `tokio::sync::Mutex` backs
//! every operation. There is no connection pool: every `JobStore` method
//! runs as one atomic transaction, and a single connection makes that
//! trivially true instead of something a pool has to be configured to
//! preserve.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteStore;

use scheduler_core::SchedulerError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection closed")]
    Closed,
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<DbError> for SchedulerError {
    fn from(err: DbError) -> Self {
        // The detailed rusqlite error (which can include column/table
        // names) never leaves this crate; only the stable store-error
        // taxonomy code does.
        SchedulerError::store(err.to_string())
    }
}
