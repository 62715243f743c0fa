//! # dacguard core
//!
//! Pure records for the dacguard access-control engines: identifiers,
//! roles, permission and right sets, propagation policies, and the typed
//! rows the storage layer hands back and forth.
//!
//! This crate contains no I/O, no storage, no cryptography. Everything here
//! is a value object.
//!
//! ## Key Types
//!
//! - [`UserId`], [`DocumentId`], [`AclEntryId`], [`DelegationId`], [`MessageId`] - row identifiers
//! - [`Permission`] / [`PermissionSet`] - HRU access-matrix rights on documents
//! - [`Right`] / [`RightSet`] - Take-Grant rights carried by delegation edges
//! - [`PropagationPolicy`] - how far a granted capability may travel
//! - [`Document`], [`AclEntry`], [`Delegation`] - the access-control state

pub mod error;
pub mod policy;
pub mod records;
pub mod rights;
pub mod time;
pub mod types;
pub mod validation;

pub use error::{CoreError, Result};
pub use policy::{PolicyMode, PropagationPolicy};
pub use records::{
    AclEntry, Delegation, Document, NewAclEntry, NewDelegation, NewDocument, NewMessage,
    NewUser, StoredMessage, User,
};
pub use rights::{Permission, PermissionSet, Right, RightSet};
pub use time::{hours_to_millis, now_millis};
pub use types::{AclEntryId, DelegationId, DocumentId, MessageId, Role, UserId};
pub use validation::{validate_content, validate_email, validate_title};
