//! Guard configuration.

use std::path::PathBuf;

use serde::Deserialize;

use dacguard_core::{PolicyMode, PropagationPolicy};
use dacguard_crypto::DhGroup;

use crate::error::{GuardError, Result};

/// Configuration for the Guard.
///
/// Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Mode used by the entry points that do not name one.
    pub default_policy: PolicyMode,
    /// Re-delegation budget when a bounded request gives none.
    pub default_delegation_depth: u32,
    /// Lifetime of a bounded delegation when the request gives none.
    pub default_expiry_hours: u32,
    /// Upper bound on any requested lifetime.
    pub max_expiry_hours: u32,
    /// DH group installed by `init_params`.
    pub dh_group: DhGroup,
    /// SQLite database file; `None` keeps state in memory.
    pub database_path: Option<PathBuf>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            default_policy: PolicyMode::Secure,
            default_delegation_depth: 1,
            default_expiry_hours: 24,
            max_expiry_hours: 720,
            dh_group: DhGroup::default(),
            database_path: None,
        }
    }
}

impl GuardConfig {
    /// Parse JSON over the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GuardError::InvalidInput(format!("invalid config: {e}")))
    }

    /// Build the propagation policy for a delegation in `mode`.
    ///
    /// DAC ignores the bounds. Secure fills gaps from the defaults and
    /// rejects a lifetime of zero or above `max_expiry_hours`.
    pub fn delegation_policy(
        &self,
        mode: PolicyMode,
        max_depth: Option<u32>,
        expires_in_hours: Option<u32>,
        now: i64,
    ) -> Result<PropagationPolicy> {
        match mode {
            PolicyMode::Dac => Ok(PropagationPolicy::Unbounded),
            PolicyMode::Secure => {
                let hours = expires_in_hours.unwrap_or(self.default_expiry_hours);
                if hours == 0 || hours > self.max_expiry_hours {
                    return Err(GuardError::InvalidInput(format!(
                        "expires_in_hours must be between 1 and {}",
                        self.max_expiry_hours
                    )));
                }
                let depth = max_depth.unwrap_or(self.default_delegation_depth);
                Ok(PropagationPolicy::bounded(depth, hours, now))
            }
        }
    }

    /// Build the propagation policy for an ACL grant in `mode`.
    pub fn grant_policy(&self, mode: PolicyMode) -> PropagationPolicy {
        match mode {
            PolicyMode::Dac => PropagationPolicy::Unbounded,
            PolicyMode::Secure => PropagationPolicy::transfer_only(),
        }
    }
}
