//! Take-Grant delegation decisions.
//!
//! [`plan_delegation`] turns a request into the edge to insert, or refuses.
//! An unbounded request reproduces the classical weakness: the new edge
//! carries no depth or expiry, whatever its parent carried. A bounded
//! request is fenced in by the parent edge it is derived from.

use dacguard_core::{Delegation, NewDelegation, PropagationPolicy, Right, RightSet, Role, UserId};

use crate::error::{PermsError, Result};
use crate::state::DelegationIndex;

/// The acting principal as the delegation engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

/// A request to add an edge from the actor to `delegate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRequest {
    pub delegate: UserId,
    pub rights: RightSet,
    pub policy: PropagationPolicy,
}

/// Decide a delegation and build the edge to insert.
pub fn plan_delegation(
    actor: Actor,
    request: &DelegationRequest,
    index: &DelegationIndex,
    now: i64,
) -> Result<NewDelegation> {
    if request.delegate == actor.id {
        return Err(PermsError::invalid("cannot delegate to oneself"));
    }
    if request.rights.is_empty() {
        return Err(PermsError::invalid("at least one right is required"));
    }
    if index.is_ancestor(request.delegate, actor.id) {
        return Err(PermsError::forbidden(format!(
            "user {} already delegates to user {}; the edge would close a cycle",
            request.delegate, actor.id
        )));
    }

    let parent = if actor.role.is_delegation_root() {
        None
    } else {
        Some(select_parent(actor.id, &request.rights, index, now)?)
    };

    let current_depth = parent.map_or(0, |p| p.current_depth + 1);

    let (can_redelegate, max_depth, expires_at) = match request.policy {
        PropagationPolicy::Unbounded => (request.rights.contains(Right::Delegate), None, None),
        PropagationPolicy::Bounded {
            max_depth,
            expires_at,
        } => {
            let (max_depth, expires_at) = match parent {
                None => (max_depth, expires_at),
                Some(parent) => bound_by_parent(parent, current_depth, max_depth, expires_at)?,
            };
            (max_depth > 0, Some(max_depth), expires_at)
        }
    };

    Ok(NewDelegation {
        delegator: actor.id,
        delegate: request.delegate,
        rights: request.rights.clone(),
        can_redelegate,
        max_depth,
        current_depth,
        expires_at,
        mode: request.policy.mode(),
        created_at: now,
    })
}

/// Pick the edge the new delegation derives from.
///
/// Among live edges into the actor that carry every requested right and
/// allow re-delegation, the one with the most room left wins.
fn select_parent<'a>(
    actor: UserId,
    rights: &RightSet,
    index: &'a DelegationIndex,
    now: i64,
) -> Result<&'a Delegation> {
    let covering: Vec<_> = index
        .live_edges_to(actor, now)
        .into_iter()
        .filter(|d| d.rights.is_superset(rights))
        .collect();

    if covering.is_empty() {
        return Err(PermsError::forbidden(format!(
            "user {actor} does not hold {rights}"
        )));
    }

    covering
        .into_iter()
        .filter(|d| d.can_redelegate)
        .max_by_key(|d| (headroom(d), std::cmp::Reverse(d.current_depth), std::cmp::Reverse(d.id)))
        .ok_or_else(|| PermsError::forbidden(format!("user {actor} may not re-delegate {rights}")))
}

/// Remaining hops below an edge; unbounded sorts above any budget.
fn headroom(edge: &Delegation) -> i64 {
    edge.max_depth.map_or(i64::MAX, i64::from)
}

/// Clamp a requested budget and lifetime to what the parent still allows.
///
/// `max_depth` is the number of further hops an edge permits, so each hop
/// spends one unit of the parent's budget.
fn bound_by_parent(
    parent: &Delegation,
    depth: u32,
    requested_depth: u32,
    requested_expiry: Option<i64>,
) -> Result<(u32, Option<i64>)> {
    let max_depth = match parent.max_depth {
        None => requested_depth,
        Some(0) => {
            return Err(PermsError::DepthExceeded {
                depth,
                max_depth: parent.current_depth,
            })
        }
        Some(parent_max) => requested_depth.min(parent_max - 1),
    };

    let expires_at = match (parent.expires_at, requested_expiry) {
        (Some(parent_exp), Some(requested)) => Some(requested.min(parent_exp)),
        (Some(parent_exp), None) => Some(parent_exp),
        (None, requested) => requested,
    };

    Ok((max_depth, expires_at))
}

/// The delegator or an administrator may revoke an edge.
pub fn authorize_revoke(actor: Actor, edge: &Delegation) -> Result<()> {
    if edge.delegator == actor.id || actor.role.is_admin() {
        Ok(())
    } else {
        Err(PermsError::forbidden(
            "only the delegator or an administrator may revoke",
        ))
    }
}
