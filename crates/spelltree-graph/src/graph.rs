//! Core graph data structure.
//!
//! `SpellGraph` wraps petgraph and adds an id index plus per-school
//! metadata. It is an owned value: callers hold one per tree and pass it
//! by reference into the builder, the repair engine and the injector.
//! Nothing here is global.
//!
//! Nodes keep their own `prerequisites`/`children` lists; the petgraph
//! edges mirror the subset of those links whose endpoints both exist.

use crate::edge::{Edge, EdgeKind, GraphEdge};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use spelltree_core::SpellNode;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Index of a node inside the petgraph storage.
pub type NodeId = NodeIndex;

/// Per-school metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGraph {
    /// School name.
    pub name: String,

    /// The primary root.
    pub root: String,

    /// Other nodes flagged as roots, in input order.
    pub element_roots: Vec<String>,

    /// Every node in the school, in input order.
    pub node_ids: Vec<String>,

    /// Deepest assigned depth.
    pub max_depth: u32,

    /// Most nodes sharing one depth.
    pub max_width: usize,
}

impl CategoryGraph {
    /// Creates metadata with no computed statistics.
    pub fn new(name: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            element_roots: Vec::new(),
            node_ids: Vec::new(),
            max_depth: 0,
            max_width: 0,
        }
    }
}

/// The spell prerequisite graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellGraph {
    /// The underlying petgraph graph.
    pub(crate) graph: DiGraph<SpellNode, Edge>,

    /// Maps spell ids to graph node indexes.
    id_index: HashMap<String, NodeId>,

    /// School metadata keyed by name.
    categories: BTreeMap<String, CategoryGraph>,
}

impl Default for SpellGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
            categories: BTreeMap::new(),
        }
    }

    /// Adds a node. An existing node with the same id is left in place and
    /// its index returned.
    pub fn add_node(&mut self, node: SpellNode) -> NodeId {
        if let Some(&index) = self.id_index.get(&node.id) {
            return index;
        }
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.id_index.insert(id, index);
        index
    }

    /// Adds a raw petgraph edge without touching the node lists.
    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId, edge: Edge) {
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, edge);
        }
    }

    /// Makes `from` a prerequisite of `to`, updating both nodes and the
    /// edge list. Returns true if anything changed.
    ///
    /// Roots never gain prerequisites; such links are refused.
    pub fn link(&mut self, from: &str, to: &str, kind: EdgeKind) -> bool {
        let (Some(from_idx), Some(to_idx)) = (self.get_index(from), self.get_index(to)) else {
            return false;
        };
        if from_idx == to_idx {
            return false;
        }

        let mut changed = false;
        if let Some(target) = self.graph.node_weight_mut(to_idx) {
            if target.is_root {
                debug!("Refusing to link {} -> root {}", from, to);
                return false;
            }
            changed |= target.add_prerequisite(from);
        }
        if let Some(source) = self.graph.node_weight_mut(from_idx) {
            changed |= source.add_child(to);
        }
        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, Edge::new(kind));
            changed = true;
        }
        changed
    }

    /// Gets a node by its string id.
    pub fn get_by_id(&self, id: &str) -> Option<&SpellNode> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Gets a mutable node by its string id.
    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut SpellNode> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight_mut(*index)
    }

    /// Gets a node by its graph index.
    pub fn get(&self, index: NodeId) -> Option<&SpellNode> {
        self.graph.node_weight(index)
    }

    /// Gets the node index for a string id.
    pub fn get_index(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// True if the id is in the node table.
    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// True if `from -> to` is in the edge list.
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.get_index(from), self.get_index(to)) {
            (Some(f), Some(t)) => self.graph.find_edge(f, t).is_some(),
            _ => false,
        }
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &SpellNode> {
        self.graph.node_weights()
    }

    /// Iterates over all node indexes.
    pub fn node_indexes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Returns all edges with source and target ids for export.
    pub fn export_edges(&self) -> Vec<GraphEdge> {
        self.graph
            .edge_references()
            .filter_map(|edge_ref| {
                let source = self.graph.node_weight(edge_ref.source())?;
                let target = self.graph.node_weight(edge_ref.target())?;
                Some(GraphEdge {
                    source: source.id.clone(),
                    target: target.id.clone(),
                    kind: edge_ref.weight().kind,
                })
            })
            .collect()
    }

    /// Registers school metadata, replacing any previous entry.
    pub fn add_category(&mut self, category: CategoryGraph) {
        self.categories.insert(category.name.clone(), category);
    }

    /// Gets school metadata.
    pub fn category(&self, name: &str) -> Option<&CategoryGraph> {
        self.categories.get(name)
    }

    pub(crate) fn category_mut(&mut self, name: &str) -> Option<&mut CategoryGraph> {
        self.categories.get_mut(name)
    }

    /// Iterates over school metadata in name order.
    pub fn categories(&self) -> impl Iterator<Item = &CategoryGraph> {
        self.categories.values()
    }

    /// School names in order. Owned so callers can mutate while iterating.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    /// Nodes of one school, in input order.
    pub fn category_nodes(&self, name: &str) -> Vec<&SpellNode> {
        self.categories
            .get(name)
            .map(|category| {
                category
                    .node_ids
                    .iter()
                    .filter_map(|id| self.get_by_id(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every node reachable from `id` through child links or outgoing
    /// edges, excluding `id` itself unless it sits on a cycle.
    pub fn descendants(&self, id: &str) -> HashSet<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            for next in self.successors(current) {
                if visited.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Direct successors of a node: its children plus edge targets.
    fn successors<'a>(&'a self, id: &str) -> Vec<&'a str> {
        let Some(index) = self.get_index(id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = Vec::new();
        if let Some(node) = self.graph.node_weight(index) {
            out.extend(
                node.children
                    .iter()
                    .filter(|c| self.contains(c))
                    .map(String::as_str),
            );
        }
        for neighbor in self.graph.neighbors_directed(index, Direction::Outgoing) {
            if let Some(node) = self.graph.node_weight(neighbor) {
                if !out.contains(&node.id.as_str()) {
                    out.push(node.id.as_str());
                }
            }
        }
        out
    }
}

impl SpellGraph {
    /// True if `id` exists and is a root or has its hard and soft
    /// requirements met by `mastered`.
    pub fn can_learn(&self, id: &str, mastered: &HashSet<String>) -> bool {
        self.get_by_id(id)
            .is_some_and(|node| node.is_root || node.requirements().is_met(mastered))
    }
}

/// Graph statistics for status output.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub categories: usize,
    pub roots: usize,
}

impl SpellGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            categories: self.categories.len(),
            roots: self.nodes().filter(|n| n.is_root).count(),
        }
    }
}

/// Flat, serializable view of the whole graph.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExport {
    pub nodes: Vec<SpellNode>,
    pub edges: Vec<GraphEdge>,
    pub categories: Vec<CategoryGraph>,
}

impl GraphExport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl SpellGraph {
    /// Snapshots nodes, edges and school metadata.
    pub fn export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes().cloned().collect(),
            edges: self.export_edges(),
            categories: self.categories().cloned().collect(),
        }
    }
}
