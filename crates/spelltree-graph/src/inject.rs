//! Procedural prerequisite injection.
//!
//! Adds extra prerequisite edges to an already valid tree for variety. The
//! pass only ever adds edges. A candidate is excluded rather than attempted
//! whenever the new edge could close a cycle, point up the tiers, or hang
//! from a node with no path to a root.

use crate::edge::EdgeKind;
use crate::graph::SpellGraph;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use spelltree_core::{InjectionConfig, SpellNode};
use tracing::{debug, info};

/// Upper bound on steps when walking a first-prerequisite chain to a root.
pub const ROOT_PATH_ITERATION_CAP: usize = 100;

/// Outcome of an injection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionReport {
    /// Nodes that passed the tier and cap filters.
    pub eligible: usize,
    /// Eligible nodes whose roll succeeded.
    pub rolled: usize,
    /// Edges added, as (prerequisite, target).
    pub added: Vec<(String, String)>,
}

/// Runs one injection pass over every school.
pub fn inject_prerequisites<R: Rng + ?Sized>(
    graph: &mut SpellGraph,
    config: &InjectionConfig,
    rng: &mut R,
) -> InjectionReport {
    let mut report = InjectionReport::default();

    for name in graph.category_names() {
        let Some(node_ids) = graph.category(&name).map(|c| c.node_ids.clone()) else {
            continue;
        };

        for id in &node_ids {
            let Some(target) = graph.get_by_id(id) else {
                continue;
            };
            if !is_eligible(target, config) {
                continue;
            }
            report.eligible += 1;

            if rng.gen_range(0..100) >= config.chance {
                continue;
            }
            report.rolled += 1;

            let pool = candidate_pool(graph, target, &node_ids, config);
            let Some(chosen) = pool.choose(rng).cloned() else {
                debug!("{}: no safe prerequisite candidate", id);
                continue;
            };

            if graph.link(&chosen, id, EdgeKind::Injected) {
                debug!("Injected {} -> {}", chosen, id);
                report.added.push((chosen, id.clone()));
            }
        }
    }

    info!(
        "Injected {} prerequisite(s) across {} eligible node(s)",
        report.added.len(),
        report.eligible
    );
    report
}

fn is_eligible(node: &SpellNode, config: &InjectionConfig) -> bool {
    !node.is_root
        && node.prerequisites.len() < config.max_prerequisites
        && node.tier >= config.min_tier
}

/// Same-school nodes that can safely become a prerequisite of `target`.
fn candidate_pool(
    graph: &SpellGraph,
    target: &SpellNode,
    node_ids: &[String],
    config: &InjectionConfig,
) -> Vec<String> {
    let descendants = graph.descendants(&target.id);

    let pool: Vec<&SpellNode> = node_ids
        .iter()
        .filter(|id| **id != target.id)
        .filter(|id| !target.prerequisites.contains(*id))
        .filter(|id| !descendants.contains(*id))
        .filter_map(|id| graph.get_by_id(id))
        .filter(|candidate| candidate.tier < target.tier)
        .filter(|candidate| is_root_connected(graph, &candidate.id))
        .collect();

    let preferred: Vec<&SpellNode> = if config.same_tier_preference {
        pool.iter()
            .copied()
            .filter(|candidate| candidate.tier + 1 == target.tier)
            .collect()
    } else {
        Vec::new()
    };

    let chosen = if preferred.is_empty() { pool } else { preferred };
    chosen.into_iter().map(|n| n.id.clone()).collect()
}

/// Follows the first-prerequisite chain until it hits a root.
///
/// Unknown ids, prerequisite-free non-roots and chains longer than
/// [`ROOT_PATH_ITERATION_CAP`] count as disconnected.
pub fn is_root_connected(graph: &SpellGraph, id: &str) -> bool {
    let mut current = id;
    for _ in 0..ROOT_PATH_ITERATION_CAP {
        let Some(node) = graph.get_by_id(current) else {
            return false;
        };
        if node.is_root {
            return true;
        }
        match node.prerequisites.first() {
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}
