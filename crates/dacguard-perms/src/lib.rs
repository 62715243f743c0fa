//! # dacguard permissions
//!
//! Decision logic for the two access-control engines.
//!
//! ## Overview
//!
//! - **Access matrix (HRU)**: subjects × documents → permission sets. A
//!   grant either lets `share` propagate freely (DAC) or is transfer-only.
//!   Copies escape the matrix entirely.
//! - **Delegation graph (Take-Grant)**: labelled edges carrying rights. An
//!   unbounded edge reproduces the classical "can" weakness; a bounded edge
//!   is limited by its parent's remaining depth and lifetime.
//!
//! Nothing here performs I/O. Each function inspects the current state and
//! returns either the row to write or a [`PermsError`], so a refused
//! operation never has side effects.
//!
//! ## Usage
//!
//! ```rust
//! use dacguard_core::{PropagationPolicy, Right, RightSet, Role, UserId};
//! use dacguard_perms::{plan_delegation, Actor, DelegationIndex, DelegationRequest};
//!
//! let hr = Actor { id: UserId::new(1), role: Role::HrManager };
//! let request = DelegationRequest {
//!     delegate: UserId::new(2),
//!     rights: RightSet::from([Right::ApproveLeave, Right::Delegate]),
//!     policy: PropagationPolicy::bounded(1, 24, 0),
//! };
//! let edge = plan_delegation(hr, &request, &DelegationIndex::new(), 0).unwrap();
//! assert_eq!(edge.max_depth, Some(1));
//! assert!(edge.can_redelegate);
//! ```

pub mod delegation;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod state;

pub use delegation::{
    authorize_revoke as authorize_delegation_revoke, plan_delegation, Actor, DelegationRequest,
};
pub use error::{PermsError, Result};
pub use graph::{graph_paths, GraphEdge, GraphPath, GraphReport, MAX_PATHS};
pub use matrix::{
    authorize_copy, authorize_delete, authorize_grant, authorize_revoke, Access, GrantRequest,
};
pub use state::DelegationIndex;
