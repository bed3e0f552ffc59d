//! Buffer schema migrations.
//!
//! Tracked in the `migrations` table so a buffer file written by an older
//! build is upgraded in place and one written by a newer build is refused.

use crate::{BufferError, BufferResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> BufferResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version > CURRENT_VERSION {
        return Err(BufferError::Migration(format!(
            "buffer schema version {} is newer than supported version {}",
            current_version, CURRENT_VERSION
        )));
    }

    if current_version == CURRENT_VERSION {
        debug!(current_version, "Buffer schema up to date");
        return Ok(());
    }

    info!(current_version, target_version = CURRENT_VERSION, "Running buffer migrations");

    if current_version < 1 {
        migrate_v1_buffered_messages(conn)?;
    }

    if current_version < 2 {
        migrate_v2_rejected_messages(conn)?;
    }

    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> BufferResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: FIFO of undelivered messages keyed by arrival order.
fn migrate_v1_buffered_messages(conn: &Connection) -> BufferResult<()> {
    info!("Applying migration v1: buffered messages");

    // AUTOINCREMENT keeps seq monotonic even after the front rows are deleted.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS buffered_messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id TEXT NOT NULL,
            category TEXT NOT NULL,
            action TEXT NOT NULL,
            label TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            enqueued_at TEXT NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 0,
            last_outcome TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_buffered_messages_message_id
            ON buffered_messages(message_id);
        ",
    )?;

    record_migration(conn, 1, "buffered_messages")?;
    Ok(())
}

/// V2: messages the relay refused during a drain, kept for the operator.
fn migrate_v2_rejected_messages(conn: &Connection) -> BufferResult<()> {
    info!("Applying migration v2: rejected messages");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS rejected_messages (
            seq INTEGER PRIMARY KEY,
            message_id TEXT NOT NULL,
            category TEXT NOT NULL,
            action TEXT NOT NULL,
            label TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            enqueued_at TEXT NOT NULL,
            attempts INTEGER NOT NULL,
            last_outcome TEXT NOT NULL,
            rejected_at TEXT NOT NULL
        );
        ",
    )?;

    record_migration(conn, 2, "rejected_messages")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn v1_buffer_is_upgraded_in_place() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )
        .unwrap();
        migrate_v1_buffered_messages(&conn).unwrap();

        run_migrations(&conn).unwrap();

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
        let rejected: i64 = conn
            .query_row("SELECT COUNT(*) FROM rejected_messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rejected, 0);
    }

    #[test]
    fn newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        record_migration(&conn, CURRENT_VERSION + 1, "from_the_future").unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(matches!(err, BufferError::Migration(_)));
    }
}
