//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Registered users and their public keys
        CREATE TABLE users (
            identity TEXT PRIMARY KEY,        -- unique identity string
            display_name TEXT NOT NULL,
            public_key BLOB NOT NULL          -- 32 bytes, X25519
        );

        -- Transfer records
        CREATE TABLE transfers (
            transfer_id BLOB PRIMARY KEY,     -- 16 random bytes
            sender TEXT NOT NULL,
            recipient TEXT NOT NULL,
            blob_handle TEXT NOT NULL,        -- opaque blob-store handle
            blob_len INTEGER NOT NULL,        -- ciphertext length in bytes
            blob_checksum BLOB NOT NULL,      -- 32 bytes, Blake3 of ciphertext
            wrapped_key BLOB NOT NULL,        -- CBOR-encoded wrapped content key
            state INTEGER NOT NULL,           -- TransferState as u8
            created_at INTEGER NOT NULL,      -- Unix ms
            expires_at INTEGER                -- Unix ms, nullable
        );

        -- Ciphertext blobs
        CREATE TABLE blobs (
            handle TEXT PRIMARY KEY,
            data BLOB NOT NULL
        );

        -- Indexes for common queries
        CREATE INDEX idx_transfers_sender ON transfers(sender);
        CREATE INDEX idx_transfers_recipient ON transfers(recipient);
        CREATE INDEX idx_transfers_expiry ON transfers(state, expires_at);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"transfers".to_string()));
        assert!(tables.contains(&"blobs".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row(
                "SELECT MAX(version) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
