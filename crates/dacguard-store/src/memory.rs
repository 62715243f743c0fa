//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite,
//! including one id sequence per table, but keeps everything in memory with
//! no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use dacguard_core::{
    AclEntry, AclEntryId, Delegation, DelegationId, Document, DocumentId, MessageId, NewAclEntry,
    NewDelegation, NewDocument, NewMessage, NewUser, StoredMessage, User, UserId,
};
use dacguard_crypto::{DhParameters, KeyExchangeSession};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// trait method takes the lock once, so each operation is atomic.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    ids: Sequences,
    users: BTreeMap<UserId, User>,
    dh_params: Option<DhParameters>,
    sessions: BTreeMap<UserId, KeyExchangeSession>,
    messages: BTreeMap<MessageId, StoredMessage>,
    documents: BTreeMap<DocumentId, Document>,
    /// Access matrix keyed by cell.
    acl: BTreeMap<(DocumentId, UserId), AclEntry>,
    delegations: BTreeMap<DelegationId, Delegation>,
}

/// Last id handed out per table, as SQLite's rowid sequences.
#[derive(Default)]
struct Sequences {
    users: i64,
    messages: i64,
    documents: i64,
    acl: i64,
    delegations: i64,
}

fn bump(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn insert_user(&self, user: &NewUser) -> Result<UserId> {
        let mut inner = self.write()?;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }
        let id = UserId::new(bump(&mut inner.ids.users));
        inner.users.insert(
            id,
            User {
                id,
                email: user.email.clone(),
                role: user.role,
                created_at: user.created_at,
            },
        );
        Ok(id)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    fn get_dh_params(&self) -> Result<Option<DhParameters>> {
        Ok(self.read()?.dh_params.clone())
    }

    fn init_dh_params(&self, params: &DhParameters) -> Result<DhParameters> {
        let mut inner = self.write()?;
        Ok(inner.dh_params.get_or_insert_with(|| params.clone()).clone())
    }

    fn get_session(&self, owner: UserId) -> Result<Option<KeyExchangeSession>> {
        Ok(self.read()?.sessions.get(&owner).cloned())
    }

    fn put_session(&self, session: &KeyExchangeSession) -> Result<()> {
        self.write()?.sessions.insert(session.owner, session.clone());
        Ok(())
    }

    fn clear_session(&self, owner: UserId) -> Result<bool> {
        Ok(self.write()?.sessions.remove(&owner).is_some())
    }

    fn insert_message(&self, message: &NewMessage) -> Result<MessageId> {
        let mut inner = self.write()?;
        let id = MessageId::new(bump(&mut inner.ids.messages));
        inner.messages.insert(
            id,
            StoredMessage {
                id,
                sender: message.sender,
                receiver: message.receiver,
                ciphertext: message.ciphertext.clone(),
                iv: message.iv.clone(),
                timestamp: message.timestamp,
                read: false,
            },
        );
        Ok(id)
    }

    fn get_message(&self, id: MessageId) -> Result<Option<StoredMessage>> {
        Ok(self.read()?.messages.get(&id).cloned())
    }

    fn messages_for(&self, receiver: UserId) -> Result<Vec<StoredMessage>> {
        Ok(self
            .read()?
            .messages
            .values()
            .filter(|m| m.receiver == receiver)
            .cloned()
            .collect())
    }

    fn all_messages(&self) -> Result<Vec<StoredMessage>> {
        Ok(self.read()?.messages.values().cloned().collect())
    }

    fn mark_read(&self, id: MessageId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.messages.get_mut(&id) {
            Some(message) => {
                message.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_message(&self, id: MessageId) -> Result<bool> {
        Ok(self.write()?.messages.remove(&id).is_some())
    }

    fn insert_document(&self, document: &NewDocument) -> Result<DocumentId> {
        let mut inner = self.write()?;
        let id = DocumentId::new(bump(&mut inner.ids.documents));
        inner.documents.insert(
            id,
            Document {
                id,
                owner: document.owner,
                title: document.title.clone(),
                content: document.content.clone(),
                confidential: document.confidential,
                created_at: document.created_at,
            },
        );
        Ok(id)
    }

    fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        Ok(self.read()?.documents.get(&id).cloned())
    }

    fn update_document_content(&self, id: DocumentId, content: &str) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.documents.get_mut(&id) {
            Some(document) => {
                document.content = content.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_document(&self, id: DocumentId) -> Result<bool> {
        let mut inner = self.write()?;
        if inner.documents.remove(&id).is_none() {
            return Ok(false);
        }
        inner.acl.retain(|(document, _), _| *document != id);
        Ok(true)
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.read()?.documents.values().cloned().collect())
    }

    fn get_acl_entry(&self, document: DocumentId, subject: UserId) -> Result<Option<AclEntry>> {
        Ok(self.read()?.acl.get(&(document, subject)).cloned())
    }

    fn upsert_acl_entry(&self, entry: &NewAclEntry) -> Result<AclEntryId> {
        let mut inner = self.write()?;
        let key = (entry.document, entry.subject);
        // A replaced cell keeps its id, as SQLite's ON CONFLICT DO UPDATE does.
        let id = match inner.acl.get(&key) {
            Some(existing) => existing.id,
            None => AclEntryId::new(bump(&mut inner.ids.acl)),
        };
        inner.acl.insert(key, entry.clone().with_id(id));
        Ok(id)
    }

    fn remove_acl_entry(&self, document: DocumentId, subject: UserId) -> Result<bool> {
        Ok(self.write()?.acl.remove(&(document, subject)).is_some())
    }

    fn acl_entries_for_document(&self, document: DocumentId) -> Result<Vec<AclEntry>> {
        Ok(self
            .read()?
            .acl
            .values()
            .filter(|e| e.document == document)
            .cloned()
            .collect())
    }

    fn acl_entries_for_subject(&self, subject: UserId) -> Result<Vec<AclEntry>> {
        Ok(self
            .read()?
            .acl
            .values()
            .filter(|e| e.subject == subject)
            .cloned()
            .collect())
    }

    fn all_acl_entries(&self) -> Result<Vec<AclEntry>> {
        Ok(self.read()?.acl.values().cloned().collect())
    }

    fn insert_delegation(&self, delegation: &NewDelegation) -> Result<DelegationId> {
        let mut inner = self.write()?;
        let id = DelegationId::new(bump(&mut inner.ids.delegations));
        inner.delegations.insert(id, delegation.clone().with_id(id));
        Ok(id)
    }

    fn get_delegation(&self, id: DelegationId) -> Result<Option<Delegation>> {
        Ok(self.read()?.delegations.get(&id).cloned())
    }

    fn deactivate_delegation(&self, id: DelegationId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.delegations.get_mut(&id) {
            Some(delegation) => Ok(std::mem::replace(&mut delegation.is_active, false)),
            None => Ok(false),
        }
    }

    fn delegations_to(&self, delegate: UserId) -> Result<Vec<Delegation>> {
        Ok(self
            .read()?
            .delegations
            .values()
            .filter(|d| d.delegate == delegate)
            .cloned()
            .collect())
    }

    fn delegations_from(&self, delegator: UserId) -> Result<Vec<Delegation>> {
        Ok(self
            .read()?
            .delegations
            .values()
            .filter(|d| d.delegator == delegator)
            .cloned()
            .collect())
    }

    fn all_delegations(&self) -> Result<Vec<Delegation>> {
        Ok(self.read()?.delegations.values().cloned().collect())
    }
}
