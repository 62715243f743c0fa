//! Delegation service (Take-Grant).

use serde::Serialize;

use dacguard_core::{
    now_millis, Delegation, DelegationId, PolicyMode, PropagationPolicy, Right, RightSet, UserId,
};
use dacguard_perms::{
    authorize_delegation_revoke, graph_paths, plan_delegation, Actor, DelegationIndex,
    DelegationRequest, GraphReport,
};
use dacguard_store::{Store, StoreExt};

use crate::config::GuardConfig;
use crate::error::{GuardError, Result};

/// A rendered reachability path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSummary {
    /// `alice@example.com -> bob@example.com -> ...`
    pub path: String,
    pub vulnerable: bool,
}

/// Graph analysis with paths rendered by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationReport {
    pub graph: GraphReport,
    pub paths: Vec<PathSummary>,
}

pub struct DelegationGraph<'a, S: Store> {
    store: &'a S,
    config: &'a GuardConfig,
}

impl<'a, S: Store> DelegationGraph<'a, S> {
    pub(crate) fn new(store: &'a S, config: &'a GuardConfig) -> Self {
        Self { store, config }
    }

    fn index(&self) -> Result<DelegationIndex> {
        Ok(DelegationIndex::from_edges(self.store.all_delegations()?))
    }

    fn actor(&self, id: UserId) -> Result<Actor> {
        let user = self.store.require_user(id)?;
        Ok(Actor {
            id: user.id,
            role: user.role,
        })
    }

    /// Delegate `rights` from `actor` to `delegate` under `policy`.
    pub fn delegate(
        &self,
        actor: UserId,
        delegate: UserId,
        rights: RightSet,
        policy: PropagationPolicy,
    ) -> Result<DelegationId> {
        tracing::debug!(
            actor = %actor,
            delegate = %delegate,
            %rights,
            mode = policy.mode().as_str(),
            "delegation requested"
        );
        let actor = self.actor(actor)?;
        self.store.require_user(delegate)?;
        let index = self.index()?;

        let request = DelegationRequest {
            delegate,
            rights,
            policy,
        };
        let edge = plan_delegation(actor, &request, &index, now_millis()).map_err(|e| {
            tracing::warn!(actor = %actor.id, delegate = %delegate, reason = %e, "delegation denied");
            GuardError::from(e)
        })?;

        let id = self.store.insert_delegation(&edge)?;
        tracing::info!(
            delegation = %id,
            delegator = %edge.delegator,
            delegate = %edge.delegate,
            depth = edge.current_depth,
            max_depth = ?edge.max_depth,
            mode = edge.mode.as_str(),
            "delegation granted"
        );
        Ok(id)
    }

    /// Delegate in `mode`, filling bounds from the configuration.
    pub fn delegate_in_mode(
        &self,
        actor: UserId,
        delegate: UserId,
        rights: RightSet,
        mode: PolicyMode,
        max_depth: Option<u32>,
        expires_in_hours: Option<u32>,
    ) -> Result<DelegationId> {
        let policy =
            self.config
                .delegation_policy(mode, max_depth, expires_in_hours, now_millis())?;
        self.delegate(actor, delegate, rights, policy)
    }

    /// Deactivate an edge. The delegator or an administrator may revoke.
    ///
    /// Revoking an already inactive edge succeeds without change.
    pub fn revoke(&self, actor: UserId, delegation: DelegationId) -> Result<()> {
        let actor = self.actor(actor)?;
        let edge = self.store.require_delegation(delegation)?;
        authorize_delegation_revoke(actor, &edge).map_err(|e| {
            tracing::warn!(actor = %actor.id, delegation = %delegation, "revoke denied");
            GuardError::from(e)
        })?;
        if self.store.deactivate_delegation(delegation)? {
            tracing::info!(delegation = %delegation, actor = %actor.id, "delegation revoked");
        }
        Ok(())
    }

    pub fn get(&self, delegation: DelegationId) -> Result<Delegation> {
        Ok(self.store.require_delegation(delegation)?)
    }

    /// Union of rights over live edges into `subject`.
    pub fn active_rights_for(&self, subject: UserId) -> Result<RightSet> {
        self.store.require_user(subject)?;
        Ok(self.index()?.active_rights_for(subject, now_millis()))
    }

    /// Whether `subject` may exercise `right`, by role or by delegation.
    pub fn has_right(&self, subject: UserId, right: Right) -> Result<bool> {
        let user = self.store.require_user(subject)?;
        if user.role.is_delegation_root() {
            return Ok(true);
        }
        Ok(self.active_rights_for(subject)?.contains(right))
    }

    /// Provenance of `subject`'s rights, nearest edge first.
    pub fn traverse_chain(&self, subject: UserId) -> Result<Vec<Delegation>> {
        self.store.require_user(subject)?;
        let index = self.index()?;
        Ok(index
            .traverse_chain(subject, now_millis())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Live edges `user` has handed out.
    pub fn given_by(&self, user: UserId) -> Result<Vec<Delegation>> {
        self.store.require_user(user)?;
        let now = now_millis();
        Ok(self
            .store
            .delegations_from(user)?
            .into_iter()
            .filter(|d| d.is_live(now))
            .collect())
    }

    /// Live edges `user` has received.
    pub fn received_by(&self, user: UserId) -> Result<Vec<Delegation>> {
        self.store.require_user(user)?;
        Ok(self.store.live_delegations_to(user, now_millis())?)
    }

    /// Reachability analysis over live edges. Administrators only.
    pub fn graph_paths(&self, actor: UserId) -> Result<DelegationReport> {
        let user = self.store.require_user(actor)?;
        if !user.role.is_admin() {
            tracing::warn!(actor = %actor, "graph analysis denied");
            return Err(GuardError::Forbidden(
                "delegation graph analysis is restricted to administrators".into(),
            ));
        }

        let graph = graph_paths(&self.index()?, now_millis());
        let users = self.store.list_users()?;
        let label = |id: UserId| {
            users
                .iter()
                .find(|u| u.id == id)
                .map_or_else(|| format!("user {id}"), |u| u.email.clone())
        };
        let paths = graph
            .paths
            .iter()
            .map(|p| PathSummary {
                path: p.render(&label),
                vulnerable: p.vulnerable,
            })
            .collect();

        Ok(DelegationReport { graph, paths })
    }
}
