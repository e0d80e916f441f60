//! Structural diagnostics.
//!
//! A read-only health report per school: orphans and the subtrees they
//! form, references to spells that do not exist, nodes the unlock
//! simulation cannot reach, prerequisite cycles, and nodes over the
//! children cap. Editors use it to decide whether to offer a repair.

use crate::depth;
use crate::graph::SpellGraph;
use crate::reachability::{simulate_unlocks, EXAMPLE_CHAIN_LIMIT};
use crate::repair::group_orphans;
use petgraph::algo::tarjan_scc;
use serde::{Deserialize, Serialize};
use spelltree_core::RepairConfig;
use std::collections::{BTreeMap, HashSet};

/// Health report for one school.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDiagnostics {
    pub category: String,
    pub total_nodes: usize,
    /// Nodes the unlock simulation reaches.
    pub reachable_count: usize,
    /// Non-root nodes no traversal from a root reaches.
    pub orphan_count: usize,
    /// References to unknown ids across prerequisite and lock lists.
    pub missing_prerequisite_count: usize,
    /// Distinct unknown ids, in first-seen order.
    pub missing_prerequisite_ids: Vec<String>,
    /// Size of each connected orphan subtree.
    pub subtree_sizes: Vec<usize>,
    pub unobtainable_count: usize,
    /// At most five example chains of blocking prerequisites.
    pub example_blocking_chains: Vec<Vec<String>>,
    /// Prerequisite cycles, each sorted by id.
    pub cycles: Vec<Vec<String>>,
    pub max_children_violations: Vec<String>,
}

impl CategoryDiagnostics {
    /// True if repair has something to do.
    pub fn needs_repair(&self) -> bool {
        self.orphan_count > 0 || self.missing_prerequisite_count > 0
    }

    /// True if nothing at all is wrong.
    pub fn is_clean(&self) -> bool {
        !self.needs_repair() && self.unobtainable_count == 0 && self.cycles.is_empty()
    }
}

/// Health report for a whole tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDiagnostics {
    pub categories: Vec<CategoryDiagnostics>,
}

impl TreeDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.categories.iter().all(CategoryDiagnostics::is_clean)
    }

    pub fn needs_repair(&self) -> bool {
        self.categories.iter().any(CategoryDiagnostics::needs_repair)
    }

    pub fn get(&self, category: &str) -> Option<&CategoryDiagnostics> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Returns a one-line summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let sum = |f: fn(&CategoryDiagnostics) -> usize| -> usize {
            self.categories.iter().map(f).sum()
        };
        format!(
            "{} schools: {} orphans, {} missing prerequisites, {} unobtainable, {} cycles",
            self.categories.len(),
            sum(|c| c.orphan_count),
            sum(|c| c.missing_prerequisite_count),
            sum(|c| c.unobtainable_count),
            sum(|c| c.cycles.len()),
        )
    }
}

/// Diagnoses every school.
pub fn diagnose(graph: &SpellGraph, config: &RepairConfig) -> TreeDiagnostics {
    let mut cycles = find_cycles(graph);
    let categories = graph
        .category_names()
        .iter()
        .filter_map(|name| {
            let mut report = diagnose_category(graph, name, config)?;
            report.cycles = cycles.remove(name).unwrap_or_default();
            Some(report)
        })
        .collect();
    TreeDiagnostics { categories }
}

/// Diagnoses one school, without cycle detection.
pub fn diagnose_category(
    graph: &SpellGraph,
    name: &str,
    config: &RepairConfig,
) -> Option<CategoryDiagnostics> {
    let category = graph.category(name)?;
    let nodes = graph.category_nodes(name);

    let mut missing_prerequisite_count = 0;
    let mut missing_prerequisite_ids: Vec<String> = Vec::new();
    for node in &nodes {
        let references = node
            .prerequisites
            .iter()
            .chain(&node.hard_prerequisites)
            .chain(&node.soft_prerequisites);
        for id in references.filter(|id| !graph.contains(id)) {
            missing_prerequisite_count += 1;
            if !missing_prerequisite_ids.contains(id) {
                missing_prerequisite_ids.push(id.clone());
            }
        }
    }

    let traversal = depth::traverse(graph, category);
    let orphans: Vec<String> = nodes
        .iter()
        .filter(|n| !n.is_root && !traversal.depths.contains_key(&n.id))
        .map(|n| n.id.clone())
        .collect();
    let subtree_sizes = group_orphans(graph, &orphans)
        .iter()
        .map(Vec::len)
        .collect();

    let reachability = simulate_unlocks(graph, name);

    let max_children_violations = nodes
        .iter()
        .filter(|n| n.children.len() > config.max_children_per_node)
        .map(|n| n.id.clone())
        .collect();

    Some(CategoryDiagnostics {
        category: name.to_string(),
        total_nodes: nodes.len(),
        reachable_count: reachability.unlocked.len(),
        orphan_count: orphans.len(),
        missing_prerequisite_count,
        missing_prerequisite_ids,
        subtree_sizes,
        unobtainable_count: reachability.locked.len(),
        example_blocking_chains: reachability.blocking_chains(EXAMPLE_CHAIN_LIMIT),
        cycles: Vec::new(),
        max_children_violations,
    })
}

/// Finds prerequisite cycles and groups them by the school of their
/// first member.
fn find_cycles(graph: &SpellGraph) -> BTreeMap<String, Vec<Vec<String>>> {
    let mut by_category: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();

    for component in tarjan_scc(&graph.graph) {
        let is_cycle = match component.as_slice() {
            [single] => graph.graph.find_edge(*single, *single).is_some(),
            _ => true,
        };
        if !is_cycle {
            continue;
        }

        let mut ids: Vec<String> = component
            .iter()
            .filter_map(|&idx| graph.get(idx))
            .map(|n| n.id.clone())
            .collect();
        ids.sort();
        let seen: HashSet<&String> = ids.iter().collect();
        if seen.len() != ids.len() {
            continue;
        }

        let Some(category) = ids
            .first()
            .and_then(|id| graph.get_by_id(id))
            .map(|n| n.category.clone())
        else {
            continue;
        };
        by_category.entry(category).or_default().push(ids);
    }

    for cycles in by_category.values_mut() {
        cycles.sort();
    }
    by_category
}
