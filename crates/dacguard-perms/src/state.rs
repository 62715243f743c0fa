//! Delegation graph state.
//!
//! A [`DelegationIndex`] is built from the delegation rows and answers the
//! read-side questions of the Take-Grant engine: which rights a subject
//! holds right now, where those rights came from, and who sits above whom.

use std::collections::{BTreeSet, HashMap};

use dacguard_core::{Delegation, DelegationId, RightSet, UserId};

/// Indexed view over every stored delegation edge, revoked ones included.
#[derive(Debug, Default)]
pub struct DelegationIndex {
    edges: HashMap<DelegationId, Delegation>,

    /// Index: delegate -> edges terminating at it.
    by_delegate: HashMap<UserId, Vec<DelegationId>>,

    /// Index: delegator -> edges leaving it.
    by_delegator: HashMap<UserId, Vec<DelegationId>>,
}

impl DelegationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from stored rows.
    pub fn from_edges(edges: impl IntoIterator<Item = Delegation>) -> Self {
        let mut index = Self::new();
        for edge in edges {
            index.insert(edge);
        }
        index
    }

    /// Add one edge, replacing any edge with the same id.
    pub fn insert(&mut self, edge: Delegation) {
        let id = edge.id;
        if let Some(old) = self.edges.remove(&id) {
            self.unlink(&old);
        }
        self.by_delegate.entry(edge.delegate).or_default().push(id);
        self.by_delegator.entry(edge.delegator).or_default().push(id);
        self.edges.insert(id, edge);
    }

    fn unlink(&mut self, edge: &Delegation) {
        if let Some(ids) = self.by_delegate.get_mut(&edge.delegate) {
            ids.retain(|id| *id != edge.id);
        }
        if let Some(ids) = self.by_delegator.get_mut(&edge.delegator) {
            ids.retain(|id| *id != edge.id);
        }
    }

    pub fn get(&self, id: DelegationId) -> Option<&Delegation> {
        self.edges.get(&id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every edge, ordered by id.
    pub fn edges(&self) -> Vec<&Delegation> {
        let mut edges: Vec<_> = self.edges.values().collect();
        edges.sort_by_key(|d| d.id);
        edges
    }

    /// Edges into `subject`, ordered by id.
    pub fn edges_to(&self, subject: UserId) -> Vec<&Delegation> {
        self.collect(self.by_delegate.get(&subject))
    }

    /// Edges out of `subject`, ordered by id.
    pub fn edges_from(&self, subject: UserId) -> Vec<&Delegation> {
        self.collect(self.by_delegator.get(&subject))
    }

    fn collect(&self, ids: Option<&Vec<DelegationId>>) -> Vec<&Delegation> {
        let mut edges: Vec<_> = ids
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default();
        edges.sort_by_key(|d| d.id);
        edges
    }

    /// Edges into `subject` that are active and unexpired at `now`.
    pub fn live_edges_to(&self, subject: UserId, now: i64) -> Vec<&Delegation> {
        self.edges_to(subject)
            .into_iter()
            .filter(|d| d.is_live(now))
            .collect()
    }

    /// Union of rights over the live edges into `subject`.
    pub fn active_rights_for(&self, subject: UserId, now: i64) -> RightSet {
        let mut rights = RightSet::empty();
        for edge in self.live_edges_to(subject, now) {
            rights.extend_from(&edge.rights);
        }
        rights
    }

    /// Provenance of `subject`'s rights, nearest edge first.
    ///
    /// At each step the live incoming edge closest to a root authority is
    /// followed. The walk stops at a subject with no live incoming edge, or
    /// when it would revisit a subject already on the chain.
    pub fn traverse_chain(&self, subject: UserId, now: i64) -> Vec<&Delegation> {
        let mut chain = Vec::new();
        let mut visited = BTreeSet::from([subject]);
        let mut current = subject;

        while let Some(edge) = self
            .live_edges_to(current, now)
            .into_iter()
            .min_by_key(|d| (d.current_depth, d.id))
        {
            chain.push(edge);
            if !visited.insert(edge.delegator) {
                break;
            }
            current = edge.delegator;
        }
        chain
    }

    /// Whether `candidate` reaches `subject` by following active edges
    /// downward. Expired but unrevoked edges still count.
    pub fn is_ancestor(&self, candidate: UserId, subject: UserId) -> bool {
        self.ancestors(subject).contains(&candidate)
    }

    /// Every subject above `subject` over active edges.
    pub fn ancestors(&self, subject: UserId) -> BTreeSet<UserId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![subject];
        while let Some(current) = stack.pop() {
            for edge in self.edges_to(current) {
                if edge.is_active && seen.insert(edge.delegator) {
                    stack.push(edge.delegator);
                }
            }
        }
        seen
    }
}
