//! Depth and width calculation.
//!
//! Breadth-first traversal from the primary root, then from every element
//! root the first traversal did not reach. Each source starts at depth 0 and
//! a node keeps the depth of its first visit.

use crate::graph::{CategoryGraph, SpellGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Depth statistics for one school.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthReport {
    /// Reached nodes in visit order.
    pub visit_order: Vec<String>,
    /// Node count per depth, index = depth.
    pub width_by_depth: Vec<usize>,
    pub max_depth: u32,
    pub max_width: usize,
}

impl DepthReport {
    /// Number of nodes any traversal reached.
    pub fn reached_count(&self) -> usize {
        self.visit_order.len()
    }
}

/// Result of a raw traversal: depth per reached id plus visit order.
pub(crate) struct Traversal {
    pub depths: HashMap<String, u32>,
    pub order: Vec<String>,
}

/// Runs the multi-source traversal without touching the graph.
///
/// Only child links that stay inside the school are followed.
pub(crate) fn traverse(graph: &SpellGraph, category: &CategoryGraph) -> Traversal {
    let mut traversal = Traversal {
        depths: HashMap::new(),
        order: Vec::new(),
    };

    if graph.contains(&category.root) {
        bfs_from(graph, category, &category.root, &mut traversal);
    }

    for id in &category.node_ids {
        if traversal.depths.contains_key(id) {
            continue;
        }
        if graph.get_by_id(id).is_some_and(|n| n.is_root) {
            bfs_from(graph, category, id, &mut traversal);
        }
    }

    traversal
}

fn bfs_from(graph: &SpellGraph, category: &CategoryGraph, source: &str, out: &mut Traversal) {
    let mut queue: VecDeque<(String, u32)> = VecDeque::new();
    out.depths.insert(source.to_string(), 0);
    out.order.push(source.to_string());
    queue.push_back((source.to_string(), 0));

    while let Some((current, depth)) = queue.pop_front() {
        let Some(node) = graph.get_by_id(&current) else {
            continue;
        };
        for child_id in &node.children {
            if out.depths.contains_key(child_id) {
                continue;
            }
            let in_school = graph
                .get_by_id(child_id)
                .is_some_and(|c| c.category == category.name);
            if !in_school {
                continue;
            }
            out.depths.insert(child_id.clone(), depth + 1);
            out.order.push(child_id.clone());
            queue.push_back((child_id.clone(), depth + 1));
        }
    }
}

/// Tallies width statistics from depths already stored on the nodes.
pub(crate) fn tally(graph: &SpellGraph, category: &CategoryGraph) -> (Vec<usize>, u32, usize) {
    let mut width_by_depth: Vec<usize> = Vec::new();
    for node in category.node_ids.iter().filter_map(|id| graph.get_by_id(id)) {
        if let Some(depth) = node.depth {
            let depth = depth as usize;
            if width_by_depth.len() <= depth {
                width_by_depth.resize(depth + 1, 0);
            }
            width_by_depth[depth] += 1;
        }
    }
    let max_depth = width_by_depth.len().saturating_sub(1) as u32;
    let max_width = width_by_depth.iter().copied().max().unwrap_or(0);
    (width_by_depth, max_depth, max_width)
}

/// Recomputes `max_depth`/`max_width` for a school from stored depths.
pub(crate) fn refresh_stats(graph: &mut SpellGraph, name: &str) {
    let Some(category) = graph.category(name) else {
        return;
    };
    let (_, max_depth, max_width) = tally(graph, category);
    if let Some(category) = graph.category_mut(name) {
        category.max_depth = max_depth;
        category.max_width = max_width;
    }
}

/// Assigns `depth` to every node of a school and updates its statistics.
///
/// Unreached nodes get `None`. Returns `None` for unknown schools.
pub fn compute_depths(graph: &mut SpellGraph, name: &str) -> Option<DepthReport> {
    let category = graph.category(name)?.clone();
    let traversal = traverse(graph, &category);

    for id in &category.node_ids {
        if let Some(node) = graph.get_by_id_mut(id) {
            node.depth = traversal.depths.get(id).copied();
        }
    }

    let (width_by_depth, max_depth, max_width) = tally(graph, &category);
    if let Some(meta) = graph.category_mut(name) {
        meta.max_depth = max_depth;
        meta.max_width = max_width;
    }

    Some(DepthReport {
        visit_order: traversal.order,
        width_by_depth,
        max_depth,
        max_width,
    })
}

/// Runs [`compute_depths`] for every school.
pub fn compute_all_depths(graph: &mut SpellGraph) -> Vec<(String, DepthReport)> {
    graph
        .category_names()
        .into_iter()
        .filter_map(|name| compute_depths(graph, &name).map(|report| (name, report)))
        .collect()
}
