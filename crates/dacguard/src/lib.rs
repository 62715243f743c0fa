//! # dacguard
//!
//! A teaching system for discretionary access control: how far does a
//! capability travel once it is granted, and how can that reach be bounded?
//! The question is asked three ways.
//!
//! - **Key exchange**: a Diffie-Hellman handshake whose secret keys an
//!   AES-256-CBC mailbox for leave requests.
//! - **Access matrix (HRU)**: documents shared with `read`/`write`/`share`.
//!   DAC grants let `share` propagate without bound; transfer-only grants
//!   stop after one hop. Copies escape the matrix either way.
//! - **Delegation graph (Take-Grant)**: rights delegated along labelled
//!   edges. DAC edges chain forever; secure edges are depth- and
//!   expiry-bounded by their parent.
//!
//! ## Usage
//!
//! ```rust
//! use dacguard::{Guard, GuardConfig};
//! use dacguard::core::{Permission, PermissionSet, PolicyMode, Role};
//!
//! let guard = Guard::in_memory(GuardConfig::default());
//! let owner = guard.register_user("owner@example.com", Role::Employee).unwrap();
//! let alice = guard.register_user("alice@example.com", Role::Employee).unwrap();
//! let bob = guard.register_user("bob@example.com", Role::Employee).unwrap();
//!
//! let matrix = guard.matrix();
//! let doc = matrix
//!     .create_document(owner.id, "Payroll", "...", true)
//!     .unwrap();
//! let read_share = PermissionSet::from([Permission::Read, Permission::Share]);
//!
//! // Transfer-only: alice can read but cannot pass the document on.
//! matrix
//!     .grant(owner.id, doc, alice.id, read_share.clone(), false, PolicyMode::Secure)
//!     .unwrap();
//! assert!(matrix
//!     .grant(alice.id, doc, bob.id, read_share, false, PolicyMode::Secure)
//!     .is_err());
//! ```
//!
//! ## Re-exports
//!
//! - `dacguard::core` - identifiers, rights, records
//! - `dacguard::crypto` - DH, AES-CBC, sealed JSON
//! - `dacguard::store` - storage trait, SQLite and in-memory stores
//! - `dacguard::perms` - access-matrix and delegation decision logic

pub mod config;
pub mod delegation;
pub mod error;
pub mod guard;
pub mod key_exchange;
pub mod mailbox;
pub mod matrix;

// Re-export component crates
pub use dacguard_core as core;
pub use dacguard_crypto as crypto;
pub use dacguard_perms as perms;
pub use dacguard_store as store;

// Re-export main types for convenience
pub use config::GuardConfig;
pub use delegation::{DelegationGraph, DelegationReport, PathSummary};
pub use error::{GuardError, Result};
pub use guard::Guard;
pub use key_exchange::KeyExchange;
pub use mailbox::{LeaveRequest, Mailbox, MessageOverview};
pub use matrix::{AccessMatrix, AccessibleDocument, AclCell, AclMatrix};

pub use dacguard_core::{
    DelegationId, DocumentId, MessageId, Permission, PermissionSet, PolicyMode,
    PropagationPolicy, Right, RightSet, Role, UserId,
};
pub use dacguard_crypto::{DecryptFailure, DhGroup, Initiator, SessionState};
