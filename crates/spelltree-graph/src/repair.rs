//! Orphan repair.
//!
//! Restores reachability for a school without throwing away content:
//!
//! 1. Strip references to ids that are not in the node table.
//! 2. Traverse from every root to find what is reachable.
//! 3. Group unreachable nodes into connected subtrees.
//! 4. Pick each subtree's entry node (no parent inside the subtree, lowest tier).
//! 5. Attach it under a reachable node of the same or the previous tier,
//!    preferring close tiers and parents with few children.
//! 6. Propagate depth through the reattached subtree.
//!
//! Repair never breaks prerequisite cycles. A cycle attached to the tree
//! still cannot be unlocked; diagnostics keep reporting it.

use crate::depth::{self, Traversal};
use crate::edge::EdgeKind;
use crate::graph::{CategoryGraph, SpellGraph};
use serde::{Deserialize, Serialize};
use spelltree_core::{RepairConfig, SpellNode};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Counters from a repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// All dangling references removed (prerequisite, child and lock lists).
    pub removed_references: usize,
    /// The subset of `removed_references` that were unified prerequisites.
    pub removed_prerequisites: usize,
    pub subtrees_reconnected: usize,
    pub nodes_recovered: usize,
    /// Orphans left unattached because no target existed.
    pub unrepaired: Vec<String>,
}

impl RepairReport {
    /// True if the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.removed_references == 0 && self.subtrees_reconnected == 0
    }

    /// Adds another report's counters to this one.
    pub fn merge(&mut self, other: RepairReport) {
        self.removed_references += other.removed_references;
        self.removed_prerequisites += other.removed_prerequisites;
        self.subtrees_reconnected += other.subtrees_reconnected;
        self.nodes_recovered += other.nodes_recovered;
        self.unrepaired.extend(other.unrepaired);
    }
}

/// Repairs every school.
pub fn repair_all(graph: &mut SpellGraph, config: &RepairConfig) -> RepairReport {
    let mut total = RepairReport::default();
    for name in graph.category_names() {
        total.merge(repair_category(graph, &name, config));
    }
    total
}

/// Repairs one school in place.
///
/// The caller owns persistence; see `SpellGraph::write_back`.
pub fn repair_category(graph: &mut SpellGraph, name: &str, config: &RepairConfig) -> RepairReport {
    let mut report = RepairReport::default();
    let Some(category) = graph.category(name).cloned() else {
        warn!("Repair requested for unknown school {}", name);
        return report;
    };

    strip_dangling(graph, &category, &mut report);

    let Traversal { mut depths, .. } = depth::traverse(graph, &category);

    // Each round attaches at least one subtree, so this is bounded by the
    // orphan count. Members a subtree root cannot reach through child links
    // are picked up in the next round.
    loop {
        let orphans = find_orphans(graph, &category, &depths);
        if orphans.is_empty() {
            break;
        }

        let mut progressed = false;
        for component in group_orphans(graph, &orphans) {
            if attach_component(graph, &category, &component, config, &mut depths, &mut report) {
                progressed = true;
            } else {
                report.unrepaired.extend(component);
            }
        }

        if !progressed {
            warn!(
                "{}: {} orphan(s) could not be reattached",
                name,
                report.unrepaired.len()
            );
            break;
        }
        report.unrepaired.clear();
    }

    for id in &category.node_ids {
        if let Some(node) = graph.get_by_id_mut(id) {
            node.depth = depths.get(id).copied();
        }
    }
    depth::refresh_stats(graph, name);

    if !report.is_noop() {
        info!(
            "{}: removed {} dangling reference(s), reconnected {} subtree(s), recovered {} node(s)",
            name, report.removed_references, report.subtrees_reconnected, report.nodes_recovered
        );
    }
    report
}

/// Removes references to unknown ids from every list of every node.
fn strip_dangling(graph: &mut SpellGraph, category: &CategoryGraph, report: &mut RepairReport) {
    for id in &category.node_ids {
        let Some(node) = graph.get_by_id(id) else {
            continue;
        };

        let keep = |list: &[String]| -> Vec<String> {
            list.iter().filter(|x| graph.contains(x)).cloned().collect()
        };
        let prerequisites = keep(&node.prerequisites);
        let hard = keep(&node.hard_prerequisites);
        let soft = keep(&node.soft_prerequisites);
        let children = keep(&node.children);

        let removed_prereqs = node.prerequisites.len() - prerequisites.len();
        let removed = removed_prereqs
            + (node.hard_prerequisites.len() - hard.len())
            + (node.soft_prerequisites.len() - soft.len())
            + (node.children.len() - children.len());
        if removed == 0 {
            continue;
        }

        debug!("{}: removing {} dangling reference(s)", id, removed);
        report.removed_references += removed;
        report.removed_prerequisites += removed_prereqs;

        if let Some(node) = graph.get_by_id_mut(id) {
            node.prerequisites = prerequisites;
            node.hard_prerequisites = hard;
            node.soft_prerequisites = soft;
            node.children = children;
            // A quorum larger than the remaining soft list can never be met
            node.soft_needed = node.soft_needed.min(node.soft_prerequisites.len() as u32);
        }
    }
}

/// Unreached non-root nodes in school order.
fn find_orphans(
    graph: &SpellGraph,
    category: &CategoryGraph,
    depths: &HashMap<String, u32>,
) -> Vec<String> {
    category
        .node_ids
        .iter()
        .filter(|id| !depths.contains_key(*id))
        .filter(|id| match graph.get_by_id(id) {
            Some(node) if node.is_root => {
                debug!("Root {} unreached; left as directly obtainable", id);
                false
            }
            Some(_) => true,
            None => false,
        })
        .cloned()
        .collect()
}

/// Partitions orphans into connected components.
///
/// Two orphans are adjacent if either lists the other as a child. The
/// reverse index is built once, so grouping is linear in the links.
pub(crate) fn group_orphans(graph: &SpellGraph, orphans: &[String]) -> Vec<Vec<String>> {
    let orphan_set: HashSet<&str> = orphans.iter().map(String::as_str).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for id in orphans {
        let Some(node) = graph.get_by_id(id) else {
            continue;
        };
        for child in &node.children {
            if orphan_set.contains(child.as_str()) {
                adjacency.entry(id.as_str()).or_default().push(child.as_str());
                adjacency.entry(child.as_str()).or_default().push(id.as_str());
            }
        }
    }

    let mut assigned: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();

    for id in orphans {
        if !assigned.insert(id.as_str()) {
            continue;
        }
        let mut component = vec![id.clone()];
        let mut queue: VecDeque<&str> = VecDeque::from([id.as_str()]);

        while let Some(current) = queue.pop_front() {
            for &next in adjacency.get(current).into_iter().flatten() {
                if assigned.insert(next) {
                    component.push(next.to_string());
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }

    components
}

/// The member with no parent inside the component and the lowest tier;
/// the first member if every member has a parent.
fn select_subtree_root(graph: &SpellGraph, component: &[String]) -> String {
    let members: HashSet<&str> = component.iter().map(String::as_str).collect();
    let has_parent: HashSet<&str> = component
        .iter()
        .filter_map(|id| graph.get_by_id(id))
        .flat_map(|node| node.children.iter())
        .map(String::as_str)
        .filter(|child| members.contains(child))
        .collect();

    component
        .iter()
        .filter(|id| !has_parent.contains(id.as_str()))
        .filter_map(|id| graph.get_by_id(id))
        .min_by_key(|node| node.tier)
        .map(|node| node.id.clone())
        .unwrap_or_else(|| component[0].clone())
}

/// Picks the reachable node a subtree of `tier` should hang from.
///
/// Candidates are reachable members of the school with tier `tier - 1` or
/// `tier`. Closest tier wins, then fewest children. The children cap is
/// dropped if nobody satisfies it. `None` means no candidate at all.
fn select_target(
    graph: &SpellGraph,
    category: &CategoryGraph,
    depths: &HashMap<String, u32>,
    tier: u32,
    config: &RepairConfig,
) -> Option<String> {
    let candidates: Vec<_> = category
        .node_ids
        .iter()
        .filter(|id| depths.contains_key(*id))
        .filter_map(|id| graph.get_by_id(id))
        .filter(|node| node.tier <= tier && node.tier.saturating_add(1) >= tier)
        .collect();

    let rank = |node: &&SpellNode| (tier - node.tier, node.children.len());

    candidates
        .iter()
        .copied()
        .filter(|node| node.children.len() < config.max_children_per_node)
        .min_by_key(rank)
        .or_else(|| candidates.iter().copied().min_by_key(rank))
        .map(|node| node.id.clone())
}

/// Links one component under a reachable parent and assigns depths.
///
/// Returns false if no parent could be found.
fn attach_component(
    graph: &mut SpellGraph,
    category: &CategoryGraph,
    component: &[String],
    config: &RepairConfig,
    depths: &mut HashMap<String, u32>,
    report: &mut RepairReport,
) -> bool {
    let subtree_root = select_subtree_root(graph, component);
    let Some(tier) = graph.get_by_id(&subtree_root).map(|n| n.tier) else {
        return false;
    };

    let target = select_target(graph, category, depths, tier, config)
        .unwrap_or_else(|| category.root.clone());
    let Some(&parent_depth) = depths.get(&target) else {
        return false;
    };

    if !graph.link(&target, &subtree_root, EdgeKind::Repair) && !graph.has_edge(&target, &subtree_root) {
        return false;
    }
    debug!(
        "Attached subtree {} ({} node(s)) under {}",
        subtree_root,
        component.len(),
        target
    );

    let members: HashSet<&str> = component.iter().map(String::as_str).collect();
    let mut queue: VecDeque<(String, u32)> = VecDeque::new();
    depths.insert(subtree_root.clone(), parent_depth + 1);
    queue.push_back((subtree_root, parent_depth + 1));
    let mut recovered = 1;

    while let Some((current, depth)) = queue.pop_front() {
        let Some(node) = graph.get_by_id(&current) else {
            continue;
        };
        for child in &node.children {
            if members.contains(child.as_str()) && !depths.contains_key(child) {
                depths.insert(child.clone(), depth + 1);
                queue.push_back((child.clone(), depth + 1));
                recovered += 1;
            }
        }
    }

    report.subtrees_reconnected += 1;
    report.nodes_recovered += recovered;
    true
}
