//! The spell node.
//!
//! A `SpellNode` is one learnable spell inside a school. Nodes carry both
//! directions of every dependency (`prerequisites` and `children`) so the
//! graph can be walked either way without an index.

use crate::requirements::PrereqRequirements;
use serde::{Deserialize, Serialize};

/// A learnable spell and its position in the prerequisite graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellNode {
    /// Opaque unique identifier (the spell's form id).
    pub id: String,

    /// The school this spell belongs to.
    pub category: String,

    /// Skill rank, 0 = lowest.
    pub tier: u32,

    /// Legacy unified prerequisite list.
    pub prerequisites: Vec<String>,

    /// Prerequisites that must all be mastered.
    pub hard_prerequisites: Vec<String>,

    /// Prerequisites of which `soft_needed` must be mastered.
    pub soft_prerequisites: Vec<String>,

    /// Quorum for `soft_prerequisites`.
    pub soft_needed: u32,

    /// Spells this one unlocks.
    pub children: Vec<String>,

    /// Distance from the nearest root. `None` until a traversal reaches it.
    pub depth: Option<u32>,

    /// Roots are always obtainable and never depend on anything.
    pub is_root: bool,
}

impl SpellNode {
    /// Creates a bare node with no links.
    pub fn new(id: impl Into<String>, category: impl Into<String>, tier: u32) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            tier,
            prerequisites: Vec::new(),
            hard_prerequisites: Vec::new(),
            soft_prerequisites: Vec::new(),
            soft_needed: 0,
            children: Vec::new(),
            depth: None,
            is_root: false,
        }
    }

    /// Builder-style setter for the unified prerequisite list.
    pub fn with_prerequisites(mut self, prerequisites: Vec<String>) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    /// Builder-style setter for the child list.
    pub fn with_children(mut self, children: Vec<String>) -> Self {
        self.children = children;
        self
    }

    /// Marks the node as a root.
    pub fn as_root(mut self) -> Self {
        self.is_root = true;
        self
    }

    /// True if the node carries explicit hard or soft lists.
    pub fn has_lock(&self) -> bool {
        !self.hard_prerequisites.is_empty() || !self.soft_prerequisites.is_empty()
    }

    /// Adds a prerequisite if not already present. Returns true if added.
    ///
    /// Nodes that carry explicit hard/soft lists also get the new id as a
    /// hard requirement, so the lock stays a superset of the unified list's
    /// new entries.
    pub fn add_prerequisite(&mut self, id: &str) -> bool {
        if self.prerequisites.iter().any(|p| p == id) {
            return false;
        }
        self.prerequisites.push(id.to_string());
        if self.has_lock() && !self.hard_prerequisites.iter().any(|p| p == id) {
            self.hard_prerequisites.push(id.to_string());
        }
        true
    }

    /// Adds a child if not already present. Returns true if added.
    pub fn add_child(&mut self, id: &str) -> bool {
        if self.children.iter().any(|c| c == id) {
            return false;
        }
        self.children.push(id.to_string());
        true
    }

    /// Removes every dependency on this node's prerequisites, including locks.
    pub fn clear_prerequisites(&mut self) {
        self.prerequisites.clear();
        self.hard_prerequisites.clear();
        self.soft_prerequisites.clear();
        self.soft_needed = 0;
    }

    /// The effective unlock requirements for this node.
    pub fn requirements(&self) -> PrereqRequirements {
        PrereqRequirements::from_node(self)
    }
}
