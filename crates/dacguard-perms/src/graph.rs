//! Delegation graph analysis.
//!
//! Enumerates multi-hop reachability through live edges. A path that crosses
//! at least one DAC edge is a witness that a right can travel further than
//! any bound would allow.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use dacguard_core::{DelegationId, PolicyMode, RightSet, UserId};

use crate::state::DelegationIndex;

/// Enumeration stops after this many paths.
pub const MAX_PATHS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: DelegationId,
    pub from: UserId,
    pub to: UserId,
    pub rights: RightSet,
    pub mode: PolicyMode,
}

/// A simple path of two or more hops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphPath {
    pub subjects: Vec<UserId>,
    pub vulnerable: bool,
}

impl GraphPath {
    /// Render as `a -> b -> c`.
    pub fn render<F>(&self, label: F) -> String
    where
        F: Fn(UserId) -> String,
    {
        self.subjects
            .iter()
            .map(|id| label(*id))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphReport {
    pub nodes: Vec<UserId>,
    pub edges: Vec<GraphEdge>,
    pub dac_edges: usize,
    pub secure_edges: usize,
    pub paths: Vec<GraphPath>,
    /// Set when enumeration hit [`MAX_PATHS`].
    pub truncated: bool,
}

/// Build the report over the edges live at `now`.
pub fn graph_paths(index: &DelegationIndex, now: i64) -> GraphReport {
    let mut report = GraphReport::default();
    let mut nodes = BTreeSet::new();
    // from -> to -> any DAC edge between them
    let mut adjacency: BTreeMap<UserId, BTreeMap<UserId, bool>> = BTreeMap::new();

    for edge in index.edges().into_iter().filter(|d| d.is_live(now)) {
        nodes.insert(edge.delegator);
        nodes.insert(edge.delegate);
        match edge.mode {
            PolicyMode::Dac => report.dac_edges += 1,
            PolicyMode::Secure => report.secure_edges += 1,
        }
        let dac = adjacency
            .entry(edge.delegator)
            .or_default()
            .entry(edge.delegate)
            .or_insert(false);
        *dac |= edge.mode == PolicyMode::Dac;

        report.edges.push(GraphEdge {
            id: edge.id,
            from: edge.delegator,
            to: edge.delegate,
            rights: edge.rights.clone(),
            mode: edge.mode,
        });
    }

    for start in &nodes {
        let mut path = vec![*start];
        walk(&adjacency, &mut path, false, &mut report);
        if report.truncated {
            break;
        }
    }

    report.nodes = nodes.into_iter().collect();
    report
}

fn walk(
    adjacency: &BTreeMap<UserId, BTreeMap<UserId, bool>>,
    path: &mut Vec<UserId>,
    vulnerable: bool,
    report: &mut GraphReport,
) {
    let Some(last) = path.last().copied() else {
        return;
    };
    let Some(next) = adjacency.get(&last) else {
        return;
    };

    for (&to, &dac) in next {
        if path.contains(&to) {
            continue;
        }
        if report.paths.len() >= MAX_PATHS {
            report.truncated = true;
            return;
        }
        path.push(to);
        let vulnerable = vulnerable || dac;
        if path.len() > 2 {
            report.paths.push(GraphPath {
                subjects: path.clone(),
                vulnerable,
            });
        }
        walk(adjacency, path, vulnerable, report);
        path.pop();
    }
}
