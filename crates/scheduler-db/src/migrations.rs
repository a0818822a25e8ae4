//! Database schema migrations.
//!
//! There is deliberately no exposed rollback operation: dropping tables
//! on an unauthenticated code path has no place in this system.

use rusqlite::Connection;

use crate::DbResult;

const CURRENT_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            contact_name TEXT NOT NULL,
            message TEXT NOT NULL,
            anchor_time TEXT NOT NULL,
            interval_value INTEGER,
            interval_unit TEXT,
            tolerance_minutes INTEGER,
            status TEXT NOT NULL,
            next_run TEXT,
            last_run TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_status_nextrun ON jobs(status, next_run);
        CREATE INDEX IF NOT EXISTS idx_jobs_status_anchor ON jobs(status, anchor_time);
        CREATE INDEX IF NOT EXISTS idx_jobs_created ON jobs(created_at);

        CREATE TABLE IF NOT EXISTS history (
            id TEXT PRIMARY KEY,
            job_id TEXT REFERENCES jobs(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            contact_name TEXT NOT NULL,
            message TEXT NOT NULL,
            status TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            error TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_history_job ON history(job_id);
        CREATE INDEX IF NOT EXISTS idx_history_timestamp ON history(timestamp);

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        INSERT INTO schema_migrations (version, applied_at)
        VALUES (1, datetime('now'));
        ",
    )?;

    tracing::info!("applied migration v1: initial schema");
    Ok(())
}

pub fn current_version(conn: &Connection) -> DbResult<i32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    Ok(current_version(conn)? < CURRENT_VERSION)
}
