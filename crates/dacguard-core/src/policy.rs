//! Propagation policies.
//!
//! A granted capability can either travel without bound (classic DAC, the
//! behaviour whose safety question is undecidable in general) or be fenced
//! in by a depth budget and an expiry.

use serde::{Deserialize, Serialize};

use crate::time::hours_to_millis;

/// Stored mode of an ACL entry or delegation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// Discretionary: holders of the propagating right may pass it on freely.
    Dac,
    /// Bounded: transfer-only ACL grants, depth/expiry-limited delegations.
    Secure,
}

impl PolicyMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PolicyMode::Dac => "dac",
            PolicyMode::Secure => "secure",
        }
    }
}

/// How far a grant may propagate.
///
/// The access matrix reads `Bounded` as transfer-only (the `max_depth` and
/// `expires_at` fields only constrain delegation edges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PropagationPolicy {
    Unbounded,
    Bounded {
        /// Requested re-delegation budget.
        max_depth: u32,
        /// Requested absolute expiry (Unix milliseconds).
        expires_at: Option<i64>,
    },
}

impl PropagationPolicy {
    /// Transfer-only policy with no further hops and no expiry.
    pub const fn transfer_only() -> Self {
        PropagationPolicy::Bounded {
            max_depth: 0,
            expires_at: None,
        }
    }

    /// Bounded policy expiring `expires_in_hours` after `now`.
    pub fn bounded(max_depth: u32, expires_in_hours: u32, now: i64) -> Self {
        PropagationPolicy::Bounded {
            max_depth,
            expires_at: Some(now.saturating_add(hours_to_millis(expires_in_hours))),
        }
    }

    pub const fn mode(&self) -> PolicyMode {
        match self {
            PropagationPolicy::Unbounded => PolicyMode::Dac,
            PropagationPolicy::Bounded { .. } => PolicyMode::Secure,
        }
    }

    pub const fn is_bounded(&self) -> bool {
        matches!(self, PropagationPolicy::Bounded { .. })
    }
}
