//! Database schema migrations for SQLite.
//!
//! Versioned and forward-only. Each migration transforms the schema from
//! version N to N+1 inside one transaction.

use rusqlite::Connection;

use dacguard_core::now_millis;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: running it against an up-to-date database does nothing.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

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
        tracing::info!(from = current, to = CURRENT_VERSION, "migrated store schema");
    }

    Ok(())
}

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
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,               -- admin | hr_manager | employee
            created_at INTEGER NOT NULL
        );

        -- Single row: the process-wide DH group
        CREATE TABLE dh_params (
            singleton INTEGER PRIMARY KEY CHECK (singleton = 1),
            p TEXT NOT NULL,                  -- hex
            g TEXT NOT NULL                   -- hex
        );

        CREATE TABLE sessions (
            owner_id INTEGER PRIMARY KEY,
            private_key TEXT,                 -- hex, nullable
            shared_secret TEXT,               -- hex, nullable
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL,
            receiver_id INTEGER NOT NULL,
            ciphertext TEXT NOT NULL,         -- base64
            iv TEXT NOT NULL,                 -- base64
            timestamp INTEGER NOT NULL,
            read INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            confidential INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Access matrix cells, one per (document, subject)
        CREATE TABLE acl_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            permissions BLOB NOT NULL,        -- CBOR set of permission names
            can_reshare INTEGER NOT NULL,
            granted_by INTEGER NOT NULL,
            mode TEXT NOT NULL,               -- dac | secure
            granted_at INTEGER NOT NULL,

            UNIQUE(document_id, subject_id)
        );

        -- Take-Grant edges; never deleted, only deactivated
        CREATE TABLE delegations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            delegator_id INTEGER NOT NULL,
            delegate_id INTEGER NOT NULL,
            rights BLOB NOT NULL,             -- CBOR set of right names
            can_redelegate INTEGER NOT NULL,
            max_depth INTEGER,                -- NULL = unbounded
            current_depth INTEGER NOT NULL,
            expires_at INTEGER,               -- NULL = never
            mode TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX idx_messages_receiver ON messages(receiver_id);
        CREATE INDEX idx_acl_subject ON acl_entries(subject_id);
        CREATE INDEX idx_delegations_delegate ON delegations(delegate_id);
        CREATE INDEX idx_delegations_delegator ON delegations(delegator_id);
        "#,
    )?;

    Ok(())
}
