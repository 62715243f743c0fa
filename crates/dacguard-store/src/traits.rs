//! Store trait: the abstract interface to the document store.
//!
//! One logical table per entity, rows keyed by auto-incrementing integer
//! ids. The store enforces no foreign keys; callers validate references
//! before writing dependent rows.

use dacguard_core::{
    AclEntry, AclEntryId, Delegation, DelegationId, Document, DocumentId, MessageId, NewAclEntry,
    NewDelegation, NewDocument, NewMessage, NewUser, StoredMessage, User, UserId,
};
use dacguard_crypto::{DhParameters, KeyExchangeSession};

use crate::error::{Result, StoreError};

/// Synchronous interface for dacguard persistence.
///
/// # Design Notes
///
/// - **Per-key atomicity**: `upsert_acl_entry` replaces the (document,
///   subject) cell in one step, so two concurrent grants cannot leave two
///   entries behind.
/// - **Write-once parameters**: `init_dh_params` keeps the first parameters
///   ever stored.
/// - **Soft delete**: delegations are deactivated, never removed.
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_user(&self, user: &NewUser) -> Result<UserId>;

    fn get_user(&self, id: UserId) -> Result<Option<User>>;

    fn list_users(&self) -> Result<Vec<User>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Key exchange
    // ─────────────────────────────────────────────────────────────────────────

    /// The process-wide DH parameters, if initialized.
    fn get_dh_params(&self) -> Result<Option<DhParameters>>;

    /// Store `params` unless parameters already exist; returns whichever
    /// parameters are stored afterwards.
    fn init_dh_params(&self, params: &DhParameters) -> Result<DhParameters>;

    fn get_session(&self, owner: UserId) -> Result<Option<KeyExchangeSession>>;

    /// Insert or replace the session of `session.owner`.
    fn put_session(&self, session: &KeyExchangeSession) -> Result<()>;

    /// Remove a session. Returns whether one existed.
    fn clear_session(&self, owner: UserId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_message(&self, message: &NewMessage) -> Result<MessageId>;

    fn get_message(&self, id: MessageId) -> Result<Option<StoredMessage>>;

    /// Messages addressed to `receiver`, oldest first.
    fn messages_for(&self, receiver: UserId) -> Result<Vec<StoredMessage>>;

    /// Every stored message, oldest first.
    fn all_messages(&self) -> Result<Vec<StoredMessage>>;

    fn mark_read(&self, id: MessageId) -> Result<bool>;

    fn remove_message(&self, id: MessageId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_document(&self, document: &NewDocument) -> Result<DocumentId>;

    fn get_document(&self, id: DocumentId) -> Result<Option<Document>>;

    fn update_document_content(&self, id: DocumentId, content: &str) -> Result<bool>;

    /// Remove a document together with every ACL entry on it.
    fn remove_document(&self, id: DocumentId) -> Result<bool>;

    fn list_documents(&self) -> Result<Vec<Document>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Access matrix
    // ─────────────────────────────────────────────────────────────────────────

    fn get_acl_entry(&self, document: DocumentId, subject: UserId) -> Result<Option<AclEntry>>;

    /// Atomically insert or replace the (document, subject) cell.
    fn upsert_acl_entry(&self, entry: &NewAclEntry) -> Result<AclEntryId>;

    fn remove_acl_entry(&self, document: DocumentId, subject: UserId) -> Result<bool>;

    fn acl_entries_for_document(&self, document: DocumentId) -> Result<Vec<AclEntry>>;

    fn acl_entries_for_subject(&self, subject: UserId) -> Result<Vec<AclEntry>>;

    fn all_acl_entries(&self) -> Result<Vec<AclEntry>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Delegations
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_delegation(&self, delegation: &NewDelegation) -> Result<DelegationId>;

    fn get_delegation(&self, id: DelegationId) -> Result<Option<Delegation>>;

    /// Clear `is_active`. Returns whether the edge was active before.
    fn deactivate_delegation(&self, id: DelegationId) -> Result<bool>;

    /// Edges terminating at `delegate`, including inactive ones.
    fn delegations_to(&self, delegate: UserId) -> Result<Vec<Delegation>>;

    /// Edges starting at `delegator`, including inactive ones.
    fn delegations_from(&self, delegator: UserId) -> Result<Vec<Delegation>>;

    fn all_delegations(&self) -> Result<Vec<Delegation>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Fetch a user or fail with `NotFound`.
    fn require_user(&self, id: UserId) -> Result<User> {
        self.get_user(id)?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    /// Fetch a document or fail with `NotFound`.
    fn require_document(&self, id: DocumentId) -> Result<Document> {
        self.get_document(id)?
            .ok_or_else(|| StoreError::NotFound(format!("document {id}")))
    }

    /// Fetch a delegation or fail with `NotFound`.
    fn require_delegation(&self, id: DelegationId) -> Result<Delegation> {
        self.get_delegation(id)?
            .ok_or_else(|| StoreError::NotFound(format!("delegation {id}")))
    }

    /// Edges into `delegate` that are active and unexpired at `now`.
    fn live_delegations_to(&self, delegate: UserId, now: i64) -> Result<Vec<Delegation>> {
        Ok(self
            .delegations_to(delegate)?
            .into_iter()
            .filter(|d| d.is_live(now))
            .collect())
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
