//! Graph builder for constructing the spell graph from raw trees.
//!
//! The builder handles a three-step process:
//! 1. Validate each school and add its nodes
//! 2. Reconcile roots and mirror prerequisite/child links (unless the
//!    input is trusted)
//! 3. Resolve prerequisite lists into graph edges

use crate::edge::{Edge, EdgeKind};
use crate::graph::{CategoryGraph, NodeId, SpellGraph};
use spelltree_core::{CategoryError, RawSchool, RawTree, Result, SpellNode, TreeError};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A school that could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCategory {
    pub name: String,
    pub reason: CategoryError,
}

/// Everything the builder produces.
#[derive(Debug)]
pub struct BuildOutput {
    pub graph: SpellGraph,
    /// Every distinct id seen, in input order.
    pub seen_ids: Vec<String>,
    /// Schools left out of the graph.
    pub skipped: Vec<SkippedCategory>,
    /// Ids listed more than once; the first record wins.
    pub duplicate_ids: Vec<String>,
}

/// Builds a `SpellGraph` from raw school data.
pub struct GraphBuilder {
    graph: SpellGraph,
    trust_prereqs: bool,
    seen_ids: Vec<String>,
    skipped: Vec<SkippedCategory>,
    duplicate_ids: Vec<String>,
    /// Prerequisite links the reconciliation pass added, as (from, to).
    derived: HashSet<(String, String)>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a builder that reconciles its input.
    pub fn new() -> Self {
        Self {
            graph: SpellGraph::new(),
            trust_prereqs: false,
            seen_ids: Vec::new(),
            skipped: Vec::new(),
            duplicate_ids: Vec::new(),
            derived: HashSet::new(),
        }
    }

    /// Treats prerequisite lists as authoritative: no root isolation and
    /// no link mirroring.
    pub fn trusted(mut self, trust_prereqs: bool) -> Self {
        self.trust_prereqs = trust_prereqs;
        self
    }

    /// Builds a graph from a complete raw tree.
    ///
    /// Fails only when the tree has no schools map. Broken schools are
    /// skipped and listed in the output.
    pub fn from_raw(raw: &RawTree) -> Result<BuildOutput> {
        let schools = raw.schools.as_ref().ok_or(TreeError::MissingSchools)?;

        let mut builder = Self::new().trusted(raw.trust_prereqs);
        for (name, school) in schools {
            builder.add_school(name, school);
        }
        Ok(builder.build())
    }

    /// Validates a school and adds its nodes.
    ///
    /// Returns false if the school was skipped.
    pub fn add_school(&mut self, name: &str, school: &RawSchool) -> bool {
        match self.try_add_school(name, school) {
            Ok(()) => true,
            Err(reason) => {
                warn!("Skipping school {}: {}", name, reason);
                self.skipped.push(SkippedCategory {
                    name: name.to_string(),
                    reason,
                });
                false
            }
        }
    }

    fn try_add_school(
        &mut self,
        name: &str,
        school: &RawSchool,
    ) -> std::result::Result<(), CategoryError> {
        let root_id = school
            .root
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or(CategoryError::MissingRoot)?;
        let nodes = school.nodes.as_ref().ok_or(CategoryError::MissingNodes)?;

        if !nodes.iter().any(|n| n.id() == Some(root_id)) {
            return Err(CategoryError::RootNotInNodes(root_id.to_string()));
        }
        if self.graph.contains(root_id) {
            return Err(CategoryError::DuplicateRoot(root_id.to_string()));
        }

        let mut category = CategoryGraph::new(name, root_id);

        for raw in nodes {
            let Some(id) = raw.id() else {
                warn!("{}: node without formId/spellId ignored", name);
                continue;
            };

            if self.graph.contains(id) {
                warn!("{}: duplicate id {} ignored", name, id);
                self.duplicate_ids.push(id.to_string());
                continue;
            }

            let mut node = SpellNode::new(id, name, raw.tier.unwrap_or(0));
            node.prerequisites = raw.prerequisites.clone().unwrap_or_default();
            node.hard_prerequisites = raw.hard_prereqs.clone().unwrap_or_default();
            node.soft_prerequisites = raw.soft_prereqs.clone().unwrap_or_default();
            node.soft_needed = raw.soft_needed.unwrap_or(0);
            node.children = raw.children.clone().unwrap_or_default();
            node.is_root = id == root_id || raw.is_root.unwrap_or(false);

            if node.is_root && id != root_id {
                category.element_roots.push(id.to_string());
            }

            self.seen_ids.push(id.to_string());
            category.node_ids.push(id.to_string());
            self.graph.add_node(node);
        }

        debug!(
            "{}: {} nodes, {} element roots",
            name,
            category.node_ids.len(),
            category.element_roots.len()
        );
        self.graph.add_category(category);
        Ok(())
    }

    /// Isolates roots and mirrors prerequisite/child links.
    ///
    /// Roots lose all prerequisites and no node may list a root as a
    /// child. Afterwards every child reference has a matching prerequisite
    /// and vice versa. Links to unknown ids are left for repair.
    pub fn reconcile(&mut self) {
        if self.trust_prereqs {
            return;
        }

        let roots: HashSet<String> = self
            .graph
            .nodes()
            .filter(|n| n.is_root)
            .map(|n| n.id.clone())
            .collect();

        let indices: Vec<NodeId> = self.graph.node_indexes().collect();

        for &index in &indices {
            if let Some(node) = self.graph.graph.node_weight_mut(index) {
                if node.is_root && (!node.prerequisites.is_empty() || node.has_lock()) {
                    debug!("Clearing prerequisites of root {}", node.id);
                    node.clear_prerequisites();
                }
                node.children.retain(|c| !roots.contains(c));
            }
        }

        // Collect the link additions first to avoid borrow issues
        let mut add_prereq: Vec<(String, String)> = Vec::new();
        let mut add_child: Vec<(String, String)> = Vec::new();

        for &index in &indices {
            let Some(node) = self.graph.get(index) else {
                continue;
            };

            for child_id in &node.children {
                if let Some(child) = self.graph.get_by_id(child_id) {
                    if !child.is_root && !child.prerequisites.contains(&node.id) {
                        add_prereq.push((node.id.clone(), child_id.clone()));
                    }
                }
            }

            for prereq_id in &node.prerequisites {
                if let Some(parent) = self.graph.get_by_id(prereq_id) {
                    if !parent.children.contains(&node.id) {
                        add_child.push((prereq_id.clone(), node.id.clone()));
                    }
                }
            }
        }

        for (from, to) in add_prereq {
            if let Some(child) = self.graph.get_by_id_mut(&to) {
                if child.add_prerequisite(&from) {
                    self.derived.insert((from, to));
                }
            }
        }
        for (from, to) in add_child {
            if let Some(parent) = self.graph.get_by_id_mut(&from) {
                parent.add_child(&to);
            }
        }
    }

    /// Turns prerequisite lists into graph edges.
    ///
    /// Only links whose endpoints both exist become edges.
    pub fn resolve_edges(&mut self) {
        let mut edges_to_add = Vec::new();

        for to_idx in self.graph.node_indexes() {
            let Some(node) = self.graph.get(to_idx) else {
                continue;
            };
            for prereq in &node.prerequisites {
                let Some(from_idx) = self.graph.get_index(prereq) else {
                    continue;
                };
                if from_idx == to_idx {
                    debug!("{} lists itself as a prerequisite", node.id);
                }
                let kind = if self.derived.contains(&(prereq.clone(), node.id.clone())) {
                    EdgeKind::Derived
                } else {
                    EdgeKind::Authored
                };
                edges_to_add.push((from_idx, to_idx, kind));
            }
        }

        for (from, to, kind) in edges_to_add {
            self.graph.add_edge(from, to, Edge::new(kind));
        }
    }

    /// Finishes building and returns the graph.
    pub fn build(mut self) -> BuildOutput {
        self.reconcile();
        self.resolve_edges();
        BuildOutput {
            graph: self.graph,
            seen_ids: self.seen_ids,
            skipped: self.skipped,
            duplicate_ids: self.duplicate_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelltree_core::RawNode;

    fn raw_node(id: &str, tier: u32, prereqs: &[&str], children: &[&str]) -> RawNode {
        let mut node = RawNode::new(id, tier);
        if !prereqs.is_empty() {
            node.prerequisites = Some(prereqs.iter().map(|s| s.to_string()).collect());
        }
        if !children.is_empty() {
            node.children = Some(children.iter().map(|s| s.to_string()).collect());
        }
        node
    }

    fn school(root: &str, nodes: Vec<RawNode>) -> RawSchool {
        RawSchool {
            root: Some(root.to_string()),
            nodes: Some(nodes),
            ..RawSchool::default()
        }
    }

    fn tree(schools: Vec<(&str, RawSchool)>) -> RawTree {
        RawTree {
            schools: Some(
                schools
                    .into_iter()
                    .map(|(n, s)| (n.to_string(), s))
                    .collect(),
            ),
            ..RawTree::default()
        }
    }

    #[test]
    fn test_builder_adds_nodes_and_edges() {
        let raw = tree(vec![(
            "Destruction",
            school(
                "r",
                vec![raw_node("r", 0, &[], &[]), raw_node("y", 1, &["r"], &[])],
            ),
        )]);

        let out = GraphBuilder::from_raw(&raw).unwrap();
        let graph = &out.graph;

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("r", "y"));
        assert_eq!(graph.get_by_id("r").unwrap().children, vec!["y"]);
        assert!(graph.get_by_id("r").unwrap().is_root);
        assert_eq!(out.seen_ids, vec!["r", "y"]);
    }

    #[test]
    fn test_child_reference_derives_prerequisite() {
        let raw = tree(vec![(
            "Alteration",
            school(
                "r",
                vec![raw_node("r", 0, &[], &["a"]), raw_node("a", 1, &[], &[])],
            ),
        )]);

        let graph = GraphBuilder::from_raw(&raw).unwrap().graph;

        assert_eq!(graph.get_by_id("a").unwrap().prerequisites, vec!["r"]);
        let edges = graph.export_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::Derived);
    }

    #[test]
    fn test_roots_are_isolated() {
        // e is an element root listed as a child of r and with r as prereq
        let mut e = raw_node("e", 0, &["r"], &["x"]);
        e.is_root = Some(true);
        let raw = tree(vec![(
            "Destruction",
            school(
                "r",
                vec![
                    raw_node("r", 0, &["x"], &["e", "x"]),
                    e,
                    raw_node("x", 1, &["r"], &["r"]),
                ],
            ),
        )]);

        let out = GraphBuilder::from_raw(&raw).unwrap();
        let graph = &out.graph;

        let r = graph.get_by_id("r").unwrap();
        let e = graph.get_by_id("e").unwrap();
        assert!(r.prerequisites.is_empty());
        assert!(e.prerequisites.is_empty());
        assert_eq!(r.children, vec!["x"]);
        assert!(graph.get_by_id("x").unwrap().children.is_empty());
        assert!(!graph.has_edge("x", "r"));
        assert!(!graph.has_edge("r", "e"));
        assert_eq!(
            graph.category("Destruction").unwrap().element_roots,
            vec!["e"]
        );
        // e -> x derived from e's child list
        assert!(graph.has_edge("e", "x"));
    }

    #[test]
    fn test_trusted_input_is_not_reconciled() {
        let mut raw = tree(vec![(
            "Mysticism",
            school(
                "r",
                vec![raw_node("r", 0, &["q"], &["a"]), raw_node("a", 1, &[], &[]), raw_node("q", 1, &[], &[])],
            ),
        )]);
        raw.trust_prereqs = true;

        let graph = GraphBuilder::from_raw(&raw).unwrap().graph;

        assert_eq!(graph.get_by_id("r").unwrap().prerequisites, vec!["q"]);
        assert!(graph.get_by_id("a").unwrap().prerequisites.is_empty());
        assert!(graph.has_edge("q", "r"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_missing_schools_is_an_error() {
        let raw = RawTree::default();
        assert!(matches!(
            GraphBuilder::from_raw(&raw),
            Err(TreeError::MissingSchools)
        ));
    }

    #[test]
    fn test_broken_schools_are_skipped() {
        let no_root = RawSchool {
            nodes: Some(vec![raw_node("a", 0, &[], &[])]),
            ..RawSchool::default()
        };
        let no_nodes = RawSchool {
            root: Some("b".to_string()),
            ..RawSchool::default()
        };
        let bad_root = school("zzz", vec![raw_node("c", 0, &[], &[])]);
        let good = school("r", vec![raw_node("r", 0, &[], &[])]);

        let raw = tree(vec![
            ("A", no_root),
            ("B", no_nodes),
            ("C", bad_root),
            ("D", good),
        ]);
        let out = GraphBuilder::from_raw(&raw).unwrap();

        assert_eq!(out.graph.node_count(), 1);
        assert_eq!(out.graph.category_names(), vec!["D"]);
        let reasons: Vec<_> = out.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                CategoryError::MissingRoot,
                CategoryError::MissingNodes,
                CategoryError::RootNotInNodes("zzz".to_string()),
            ]
        );
    }

    #[test]
    fn test_root_taken_by_earlier_school_is_skipped() {
        let raw = tree(vec![
            (
                "Alteration",
                school(
                    "R",
                    vec![raw_node("R", 0, &[], &[]), raw_node("S", 1, &["R"], &[])],
                ),
            ),
            (
                "Conjuration",
                school(
                    "S",
                    vec![raw_node("S", 0, &[], &[]), raw_node("B1", 1, &["S"], &[])],
                ),
            ),
        ]);

        let out = GraphBuilder::from_raw(&raw).unwrap();

        assert_eq!(out.graph.category_names(), vec!["Alteration"]);
        assert_eq!(
            out.skipped,
            vec![SkippedCategory {
                name: "Conjuration".to_string(),
                reason: CategoryError::DuplicateRoot("S".to_string()),
            }]
        );
        let s = out.graph.get_by_id("S").unwrap();
        assert_eq!(s.category, "Alteration");
        assert_eq!(s.prerequisites, vec!["R"]);
        assert!(!out.graph.contains("B1"));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let raw = tree(vec![(
            "Illusion",
            school(
                "r",
                vec![
                    raw_node("r", 0, &[], &[]),
                    raw_node("a", 1, &["r"], &[]),
                    raw_node("a", 4, &[], &[]),
                ],
            ),
        )]);

        let out = GraphBuilder::from_raw(&raw).unwrap();
        assert_eq!(out.duplicate_ids, vec!["a"]);
        assert_eq!(out.graph.get_by_id("a").unwrap().tier, 1);
        assert_eq!(out.graph.category("Illusion").unwrap().node_ids.len(), 2);
    }

    #[test]
    fn test_dangling_references_do_not_become_edges() {
        let raw = tree(vec![(
            "Destruction",
            school(
                "r",
                vec![
                    raw_node("r", 0, &[], &["ghost"]),
                    raw_node("z", 1, &["0xDEAD"], &[]),
                ],
            ),
        )]);

        let graph = GraphBuilder::from_raw(&raw).unwrap().graph;
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.get_by_id("z").unwrap().prerequisites, vec!["0xDEAD"]);
    }
}
