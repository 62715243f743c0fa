//! Strong type definitions for dacguard.
//!
//! Every table row is keyed by an auto-incrementing integer assigned by the
//! store. The identifiers are newtypes so a `DocumentId` can never be passed
//! where a `UserId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw row id.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw row id.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

row_id!(
    /// Identifier of a principal (user row).
    UserId,
    "user"
);
row_id!(
    /// Identifier of a document row.
    DocumentId,
    "doc"
);
row_id!(
    /// Identifier of an access-matrix cell.
    AclEntryId,
    "acl"
);
row_id!(
    /// Identifier of a delegation edge.
    DelegationId,
    "delegation"
);
row_id!(
    /// Identifier of a stored encrypted message.
    MessageId,
    "message"
);

/// Organisational role of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    HrManager,
    Employee,
}

impl Role {
    /// Wire name of the role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::HrManager => "hr_manager",
            Role::Employee => "employee",
        }
    }

    /// Roles that may read the full access matrix.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Roles that act as root authorities for delegation.
    pub fn is_delegation_root(&self) -> bool {
        matches!(self, Role::Admin | Role::HrManager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "hr_manager" => Ok(Role::HrManager),
            "employee" => Ok(Role::Employee),
            other => Err(CoreError::InvalidInput(format!("unknown role: {other}"))),
        }
    }
}
