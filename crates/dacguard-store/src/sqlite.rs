//! SQLite implementation of the Store trait.
//!
//! This is the persistent storage backend. It uses rusqlite with bundled
//! SQLite behind a mutex; every trait method runs on the locked connection,
//! so each operation is atomic with respect to the others.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use dacguard_core::{
    AclEntry, AclEntryId, Delegation, DelegationId, Document, DocumentId, MessageId, NewAclEntry,
    NewDelegation, NewDocument, NewMessage, NewUser, PolicyMode, Role, StoredMessage, User,
    UserId,
};
use dacguard_crypto::{DhParameters, KeyExchangeSession, PrivateKey, SharedSecret};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening sqlite store");
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        f(&mut conn)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Column codecs
// ─────────────────────────────────────────────────────────────────────────────

fn conversion_error(idx: usize, ty: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(StoreError::InvalidData(message)))
}

fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn cbor_column<T: DeserializeOwned>(row: &Row<'_>, name: &str) -> rusqlite::Result<T> {
    let idx = row.as_ref().column_index(name)?;
    let bytes: Vec<u8> = row.get(idx)?;
    ciborium::from_reader(&bytes[..]).map_err(|e| conversion_error(idx, Type::Blob, e.to_string()))
}

fn parse_mode(s: &str) -> Option<PolicyMode> {
    match s {
        "dac" => Some(PolicyMode::Dac),
        "secure" => Some(PolicyMode::Secure),
        _ => None,
    }
}

fn mode_column(row: &Row<'_>, name: &str) -> rusqlite::Result<PolicyMode> {
    let idx = row.as_ref().column_index(name)?;
    let raw: String = row.get(idx)?;
    parse_mode(&raw).ok_or_else(|| conversion_error(idx, Type::Text, format!("unknown mode {raw}")))
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    let role = Role::from_str(&role).map_err(|e| conversion_error(2, Type::Text, e.to_string()))?;
    Ok(User {
        id: UserId::new(row.get("id")?),
        email: row.get("email")?,
        role,
        created_at: row.get("created_at")?,
    })
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<KeyExchangeSession> {
    let private_key: Option<String> = row.get("private_key")?;
    let shared_secret: Option<String> = row.get("shared_secret")?;
    Ok(KeyExchangeSession {
        owner: UserId::new(row.get("owner_id")?),
        private_key: private_key
            .map(|hex| PrivateKey::from_hex(&hex))
            .transpose()
            .map_err(|e| conversion_error(1, Type::Text, e.to_string()))?,
        shared_secret: shared_secret
            .map(|hex| SharedSecret::from_hex(&hex))
            .transpose()
            .map_err(|e| conversion_error(2, Type::Text, e.to_string()))?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: MessageId::new(row.get("id")?),
        sender: UserId::new(row.get("sender_id")?),
        receiver: UserId::new(row.get("receiver_id")?),
        ciphertext: row.get("ciphertext")?,
        iv: row.get("iv")?,
        timestamp: row.get("timestamp")?,
        read: row.get("read")?,
    })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: DocumentId::new(row.get("id")?),
        owner: UserId::new(row.get("owner_id")?),
        title: row.get("title")?,
        content: row.get("content")?,
        confidential: row.get("confidential")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_acl_entry(row: &Row<'_>) -> rusqlite::Result<AclEntry> {
    Ok(AclEntry {
        id: AclEntryId::new(row.get("id")?),
        document: DocumentId::new(row.get("document_id")?),
        subject: UserId::new(row.get("subject_id")?),
        permissions: cbor_column(row, "permissions")?,
        can_reshare: row.get("can_reshare")?,
        granted_by: UserId::new(row.get("granted_by")?),
        mode: mode_column(row, "mode")?,
        granted_at: row.get("granted_at")?,
    })
}

fn row_to_delegation(row: &Row<'_>) -> rusqlite::Result<Delegation> {
    Ok(Delegation {
        id: DelegationId::new(row.get("id")?),
        delegator: UserId::new(row.get("delegator_id")?),
        delegate: UserId::new(row.get("delegate_id")?),
        rights: cbor_column(row, "rights")?,
        can_redelegate: row.get("can_redelegate")?,
        max_depth: row.get("max_depth")?,
        current_depth: row.get("current_depth")?,
        expires_at: row.get("expires_at")?,
        mode: mode_column(row, "mode")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
    })
}

/// Run a SELECT and collect every row through `map`.
fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
    P: rusqlite::Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, map)?;
    rows.collect::<rusqlite::Result<Vec<T>>>()
        .map_err(StoreError::from)
}

impl Store for SqliteStore {
    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_user(&self, user: &NewUser) -> Result<UserId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, role, created_at) VALUES (?1, ?2, ?3)",
                params![user.email, user.role.as_str(), user.created_at],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::Conflict(format!("email already registered: {}", user.email))
                }
                other => StoreError::Database(other),
            })?;
            Ok(UserId::new(conn.last_insert_rowid()))
        })
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM users WHERE id = ?1",
                params![id.get()],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| query_all(conn, "SELECT * FROM users ORDER BY id", [], row_to_user))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key exchange
    // ─────────────────────────────────────────────────────────────────────────

    fn get_dh_params(&self) -> Result<Option<DhParameters>> {
        self.with_conn(|conn| {
            let row: Option<(String, String)> = conn
                .query_row("SELECT p, g FROM dh_params WHERE singleton = 1", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .optional()?;
            row.map(|(p, g)| {
                DhParameters::from_hex(&p, &g).map_err(|e| StoreError::InvalidData(e.to_string()))
            })
            .transpose()
        })
    }

    fn init_dh_params(&self, params: &DhParameters) -> Result<DhParameters> {
        let (p, g) = params.to_hex();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO dh_params (singleton, p, g) VALUES (1, ?1, ?2)",
                params![p, g],
            )?;
            Ok(())
        })?;
        self.get_dh_params()?
            .ok_or_else(|| StoreError::InvalidData("dh parameters missing after insert".into()))
    }

    fn get_session(&self, owner: UserId) -> Result<Option<KeyExchangeSession>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM sessions WHERE owner_id = ?1",
                params![owner.get()],
                row_to_session,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn put_session(&self, session: &KeyExchangeSession) -> Result<()> {
        let private_key = session.private_key.as_ref().map(PrivateKey::to_hex);
        let shared_secret = session.shared_secret.as_ref().map(SharedSecret::to_hex);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (owner_id, private_key, shared_secret, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(owner_id) DO UPDATE SET
                    private_key = excluded.private_key,
                    shared_secret = excluded.shared_secret,
                    updated_at = excluded.updated_at",
                params![
                    session.owner.get(),
                    private_key,
                    shared_secret,
                    session.updated_at
                ],
            )?;
            Ok(())
        })
    }

    fn clear_session(&self, owner: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM sessions WHERE owner_id = ?1",
                params![owner.get()],
            )?;
            Ok(n > 0)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_message(&self, message: &NewMessage) -> Result<MessageId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, ciphertext, iv, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.sender.get(),
                    message.receiver.get(),
                    message.ciphertext,
                    message.iv,
                    message.timestamp
                ],
            )?;
            Ok(MessageId::new(conn.last_insert_rowid()))
        })
    }

    fn get_message(&self, id: MessageId) -> Result<Option<StoredMessage>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM messages WHERE id = ?1",
                params![id.get()],
                row_to_message,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn messages_for(&self, receiver: UserId) -> Result<Vec<StoredMessage>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM messages WHERE receiver_id = ?1 ORDER BY id",
                params![receiver.get()],
                row_to_message,
            )
        })
    }

    fn all_messages(&self) -> Result<Vec<StoredMessage>> {
        self.with_conn(|conn| {
            query_all(conn, "SELECT * FROM messages ORDER BY id", [], row_to_message)
        })
    }

    fn mark_read(&self, id: MessageId) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("UPDATE messages SET read = 1 WHERE id = ?1", params![id.get()])?;
            Ok(n > 0)
        })
    }

    fn remove_message(&self, id: MessageId) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM messages WHERE id = ?1", params![id.get()])?;
            Ok(n > 0)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_document(&self, document: &NewDocument) -> Result<DocumentId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (owner_id, title, content, confidential, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    document.owner.get(),
                    document.title,
                    document.content,
                    document.confidential,
                    document.created_at
                ],
            )?;
            Ok(DocumentId::new(conn.last_insert_rowid()))
        })
    }

    fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM documents WHERE id = ?1",
                params![id.get()],
                row_to_document,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn update_document_content(&self, id: DocumentId, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE documents SET content = ?2 WHERE id = ?1",
                params![id.get(), content],
            )?;
            Ok(n > 0)
        })
    }

    fn remove_document(&self, id: DocumentId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM acl_entries WHERE document_id = ?1",
                params![id.get()],
            )?;
            let n = tx.execute("DELETE FROM documents WHERE id = ?1", params![id.get()])?;
            tx.commit()?;
            Ok(n > 0)
        })
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        self.with_conn(|conn| {
            query_all(conn, "SELECT * FROM documents ORDER BY id", [], row_to_document)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access matrix
    // ─────────────────────────────────────────────────────────────────────────

    fn get_acl_entry(&self, document: DocumentId, subject: UserId) -> Result<Option<AclEntry>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM acl_entries WHERE document_id = ?1 AND subject_id = ?2",
                params![document.get(), subject.get()],
                row_to_acl_entry,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn upsert_acl_entry(&self, entry: &NewAclEntry) -> Result<AclEntryId> {
        let permissions = to_cbor(&entry.permissions)?;
        self.with_conn(|conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO acl_entries
                    (document_id, subject_id, permissions, can_reshare, granted_by, mode, granted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(document_id, subject_id) DO UPDATE SET
                    permissions = excluded.permissions,
                    can_reshare = excluded.can_reshare,
                    granted_by = excluded.granted_by,
                    mode = excluded.mode,
                    granted_at = excluded.granted_at
                 RETURNING id",
                params![
                    entry.document.get(),
                    entry.subject.get(),
                    permissions,
                    entry.can_reshare,
                    entry.granted_by.get(),
                    entry.mode.as_str(),
                    entry.granted_at
                ],
                |row| row.get(0),
            )?;
            Ok(AclEntryId::new(id))
        })
    }

    fn remove_acl_entry(&self, document: DocumentId, subject: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM acl_entries WHERE document_id = ?1 AND subject_id = ?2",
                params![document.get(), subject.get()],
            )?;
            Ok(n > 0)
        })
    }

    fn acl_entries_for_document(&self, document: DocumentId) -> Result<Vec<AclEntry>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM acl_entries WHERE document_id = ?1 ORDER BY subject_id",
                params![document.get()],
                row_to_acl_entry,
            )
        })
    }

    fn acl_entries_for_subject(&self, subject: UserId) -> Result<Vec<AclEntry>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM acl_entries WHERE subject_id = ?1 ORDER BY document_id",
                params![subject.get()],
                row_to_acl_entry,
            )
        })
    }

    fn all_acl_entries(&self) -> Result<Vec<AclEntry>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM acl_entries ORDER BY document_id, subject_id",
                [],
                row_to_acl_entry,
            )
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delegations
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_delegation(&self, delegation: &NewDelegation) -> Result<DelegationId> {
        let rights = to_cbor(&delegation.rights)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO delegations
                    (delegator_id, delegate_id, rights, can_redelegate, max_depth,
                     current_depth, expires_at, mode, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
                params![
                    delegation.delegator.get(),
                    delegation.delegate.get(),
                    rights,
                    delegation.can_redelegate,
                    delegation.max_depth,
                    delegation.current_depth,
                    delegation.expires_at,
                    delegation.mode.as_str(),
                    delegation.created_at
                ],
            )?;
            Ok(DelegationId::new(conn.last_insert_rowid()))
        })
    }

    fn get_delegation(&self, id: DelegationId) -> Result<Option<Delegation>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM delegations WHERE id = ?1",
                params![id.get()],
                row_to_delegation,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn deactivate_delegation(&self, id: DelegationId) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE delegations SET is_active = 0 WHERE id = ?1 AND is_active = 1",
                params![id.get()],
            )?;
            Ok(n > 0)
        })
    }

    fn delegations_to(&self, delegate: UserId) -> Result<Vec<Delegation>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM delegations WHERE delegate_id = ?1 ORDER BY id",
                params![delegate.get()],
                row_to_delegation,
            )
        })
    }

    fn delegations_from(&self, delegator: UserId) -> Result<Vec<Delegation>> {
        self.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM delegations WHERE delegator_id = ?1 ORDER BY id",
                params![delegator.get()],
                row_to_delegation,
            )
        })
    }

    fn all_delegations(&self) -> Result<Vec<Delegation>> {
        self.with_conn(|conn| {
            query_all(conn, "SELECT * FROM delegations ORDER BY id", [], row_to_delegation)
        })
    }
}
