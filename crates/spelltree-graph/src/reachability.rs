//! Unlock simulation.
//!
//! Starting from a school's root, repeatedly unlock every node whose
//! prerequisites are all unlocked until nothing changes. Whatever is still
//! locked at the fixpoint can never be learned, and its locked
//! prerequisites explain why.

use crate::graph::SpellGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Extra passes allowed beyond the node count.
///
/// A well-formed tree converges in `max_depth + 1` passes. The cap only
/// exists to guarantee termination on malformed input.
pub const PASS_CAP_SLACK: usize = 10;

/// How many example chains user-facing output shows.
pub const EXAMPLE_CHAIN_LIMIT: usize = 5;

/// A node the simulation could not unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedNode {
    pub id: String,
    pub tier: u32,
    pub prerequisites: Vec<String>,
    /// Prerequisites that are themselves locked (or do not exist).
    pub blocking: Vec<String>,
}

/// Result of simulating unlocks for one school.
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    pub unlocked: HashSet<String>,
    /// Locked nodes in school order.
    pub locked: Vec<LockedNode>,
    pub passes: usize,
    /// False if the pass cap stopped the simulation.
    pub converged: bool,
}

impl Reachability {
    /// True if every node in the school can be unlocked.
    pub fn is_complete(&self) -> bool {
        self.locked.is_empty()
    }

    /// Example chains of blocking prerequisites, one per locked node.
    ///
    /// Each chain starts at a locked node and follows its first blocking
    /// prerequisite until it reaches a node with no locked prerequisites,
    /// an unknown id, or a node already on the chain.
    pub fn blocking_chains(&self, limit: usize) -> Vec<Vec<String>> {
        let by_id: HashMap<&str, &LockedNode> =
            self.locked.iter().map(|n| (n.id.as_str(), n)).collect();

        self.locked
            .iter()
            .take(limit)
            .map(|start| {
                let mut chain = vec![start.id.clone()];
                let mut current = start;
                while let Some(next) = current.blocking.first() {
                    let seen = chain.contains(next);
                    chain.push(next.clone());
                    if seen {
                        break;
                    }
                    match by_id.get(next.as_str()) {
                        Some(node) => current = node,
                        None => break,
                    }
                }
                chain
            })
            .collect()
    }
}

/// Simulates unlocking a school from its root.
///
/// A node with no prerequisites at all counts as unlockable even when it
/// is not flagged as a root. Prerequisites outside the school never unlock.
/// Returns an empty result for unknown schools.
pub fn simulate_unlocks(graph: &SpellGraph, category: &str) -> Reachability {
    let Some(meta) = graph.category(category) else {
        return Reachability::default();
    };

    let mut unlocked: HashSet<String> = HashSet::new();
    unlocked.insert(meta.root.clone());

    let max_passes = meta.node_ids.len() + PASS_CAP_SLACK;
    let mut passes = 0;
    let mut changed = true;

    while changed && passes < max_passes {
        changed = false;
        passes += 1;

        for id in &meta.node_ids {
            if unlocked.contains(id) {
                continue;
            }
            let Some(node) = graph.get_by_id(id) else {
                continue;
            };
            if node
                .prerequisites
                .iter()
                .all(|prereq| unlocked.contains(prereq))
            {
                unlocked.insert(id.clone());
                changed = true;
            }
        }
    }

    let locked = meta
        .node_ids
        .iter()
        .filter(|id| !unlocked.contains(*id))
        .filter_map(|id| graph.get_by_id(id))
        .map(|node| LockedNode {
            id: node.id.clone(),
            tier: node.tier,
            prerequisites: node.prerequisites.clone(),
            blocking: node
                .prerequisites
                .iter()
                .filter(|p| !unlocked.contains(*p))
                .cloned()
                .collect(),
        })
        .collect();

    Reachability {
        unlocked,
        locked,
        passes,
        converged: !changed,
    }
}
