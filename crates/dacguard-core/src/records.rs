//! Typed rows exchanged with the storage layer.
//!
//! `New*` structs are what callers hand to the store; the store assigns the
//! id and returns the full row.

use serde::{Deserialize, Serialize};

use crate::policy::PolicyMode;
use crate::rights::{PermissionSet, RightSet};
use crate::types::{AclEntryId, DelegationId, DocumentId, MessageId, Role, UserId};

/// A registered principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub role: Role,
    pub created_at: i64,
}

/// A document (an object of the access matrix).
///
/// The owner relation is permanent. The owner implicitly holds every
/// permission; that is never stored as an ACL row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner: UserId,
    pub title: String,
    pub content: String,
    pub confidential: bool,
    pub created_at: i64,
}

impl Document {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub owner: UserId,
    pub title: String,
    pub content: String,
    pub confidential: bool,
    pub created_at: i64,
}

/// One cell of the access matrix: the rights of `subject` over `document`.
///
/// At most one entry exists per (document, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub id: AclEntryId,
    pub document: DocumentId,
    pub subject: UserId,
    pub permissions: PermissionSet,
    pub can_reshare: bool,
    pub granted_by: UserId,
    pub mode: PolicyMode,
    pub granted_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAclEntry {
    pub document: DocumentId,
    pub subject: UserId,
    pub permissions: PermissionSet,
    pub can_reshare: bool,
    pub granted_by: UserId,
    pub mode: PolicyMode,
    pub granted_at: i64,
}

impl NewAclEntry {
    /// Attach the id assigned by the store.
    pub fn with_id(self, id: AclEntryId) -> AclEntry {
        AclEntry {
            id,
            document: self.document,
            subject: self.subject,
            permissions: self.permissions,
            can_reshare: self.can_reshare,
            granted_by: self.granted_by,
            mode: self.mode,
            granted_at: self.granted_at,
        }
    }
}

/// A Take-Grant edge: `delegator` passes `rights` to `delegate`.
///
/// Edges are never deleted. Revocation clears `is_active`; expiry is
/// evaluated at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub id: DelegationId,
    pub delegator: UserId,
    pub delegate: UserId,
    pub rights: RightSet,
    pub can_redelegate: bool,
    /// Remaining re-delegation budget; `None` is unbounded.
    pub max_depth: Option<u32>,
    /// Hops from the root authority that started the chain.
    pub current_depth: u32,
    /// Unix milliseconds; `None` never expires.
    pub expires_at: Option<i64>,
    pub mode: PolicyMode,
    pub is_active: bool,
    pub created_at: i64,
}

impl Delegation {
    /// Expired edges stay `is_active` until revoked but grant nothing.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }

    /// Active and not expired.
    pub fn is_live(&self, now: i64) -> bool {
        self.is_active && !self.is_expired(now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDelegation {
    pub delegator: UserId,
    pub delegate: UserId,
    pub rights: RightSet,
    pub can_redelegate: bool,
    pub max_depth: Option<u32>,
    pub current_depth: u32,
    pub expires_at: Option<i64>,
    pub mode: PolicyMode,
    pub created_at: i64,
}

impl NewDelegation {
    /// Attach the id assigned by the store. New edges start active.
    pub fn with_id(self, id: DelegationId) -> Delegation {
        Delegation {
            id,
            delegator: self.delegator,
            delegate: self.delegate,
            rights: self.rights,
            can_redelegate: self.can_redelegate,
            max_depth: self.max_depth,
            current_depth: self.current_depth,
            expires_at: self.expires_at,
            mode: self.mode,
            is_active: true,
            created_at: self.created_at,
        }
    }
}

/// An encrypted message at rest. The ciphertext is opaque to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub sender: UserId,
    pub receiver: UserId,
    /// Base64 ciphertext.
    pub ciphertext: String,
    /// Base64 IV.
    pub iv: String,
    pub timestamp: i64,
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender: UserId,
    pub receiver: UserId,
    pub ciphertext: String,
    pub iv: String,
    pub timestamp: i64,
}
