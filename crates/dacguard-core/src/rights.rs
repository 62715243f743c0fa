//! Rights carried by access-matrix cells and delegation edges.
//!
//! Two independent vocabularies:
//!
//! - [`Permission`]: what a subject may do to a document (HRU matrix cell).
//! - [`Right`]: what a principal may do in the leave workflow, passed along
//!   Take-Grant edges. `Right::Delegate` is the `grant` label of the model.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A right over a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Share,
}

impl Permission {
    pub const ALL: [Permission; 3] = [Permission::Read, Permission::Write, Permission::Share];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Share => "share",
        }
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "share" => Ok(Permission::Share),
            other => Err(CoreError::InvalidInput(format!("unknown permission: {other}"))),
        }
    }
}

/// A right in the leave workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Right {
    ApproveLeave,
    ViewRequests,
    Delegate,
}

impl Right {
    pub const ALL: [Right; 3] = [Right::ApproveLeave, Right::ViewRequests, Right::Delegate];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Right::ApproveLeave => "approve_leave",
            Right::ViewRequests => "view_requests",
            Right::Delegate => "delegate",
        }
    }
}

impl FromStr for Right {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve_leave" => Ok(Right::ApproveLeave),
            "view_requests" => Ok(Right::ViewRequests),
            "delegate" => Ok(Right::Delegate),
            other => Err(CoreError::InvalidInput(format!("unknown right: {other}"))),
        }
    }
}

macro_rules! label_set {
    ($(#[$meta:meta])* $name:ident, $item:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(BTreeSet<$item>);

        impl $name {
            /// The empty set.
            pub fn empty() -> Self {
                Self(BTreeSet::new())
            }

            /// Every label in the vocabulary.
            pub fn all() -> Self {
                $item::ALL.into_iter().collect()
            }

            pub fn contains(&self, item: $item) -> bool {
                self.0.contains(&item)
            }

            pub fn insert(&mut self, item: $item) -> bool {
                self.0.insert(item)
            }

            pub fn remove(&mut self, item: $item) -> bool {
                self.0.remove(&item)
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// True when every label of `other` is also in `self`.
            pub fn is_superset(&self, other: &Self) -> bool {
                self.0.is_superset(&other.0)
            }

            /// Labels present in either set.
            pub fn union(&self, other: &Self) -> Self {
                Self(self.0.union(&other.0).copied().collect())
            }

            /// Add every label of `other` to `self`.
            pub fn extend_from(&mut self, other: &Self) {
                self.0.extend(other.0.iter().copied());
            }

            pub fn iter(&self) -> impl Iterator<Item = $item> + '_ {
                self.0.iter().copied()
            }

            /// Parse a list of wire names.
            pub fn parse_list<I, S>(names: I) -> Result<Self, CoreError>
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                names
                    .into_iter()
                    .map(|name| name.as_ref().parse::<$item>())
                    .collect()
            }
        }

        impl FromIterator<$item> for $name {
            fn from_iter<T: IntoIterator<Item = $item>>(iter: T) -> Self {
                Self(iter.into_iter().collect())
            }
        }

        impl<const N: usize> From<[$item; N]> for $name {
            fn from(items: [$item; N]) -> Self {
                items.into_iter().collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let names: Vec<&str> = self.0.iter().map(|item| item.as_str()).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
        }
    };
}

label_set!(
    /// Set of [`Permission`]s held in one access-matrix cell.
    PermissionSet,
    Permission
);
label_set!(
    /// Set of [`Right`]s carried by one delegation edge.
    RightSet,
    Right
);
