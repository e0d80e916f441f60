//! Hard/soft prerequisite rules.
//!
//! A spell's requirements come in two flavours: hard prerequisites must all
//! be mastered, soft prerequisites form a quorum where `soft_needed` of them
//! must be mastered. Nodes without explicit lists fall back to the legacy
//! unified `prerequisites` list, every entry of which is hard.

use crate::node::SpellNode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Effective unlock requirements of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrereqRequirements {
    pub hard: Vec<String>,
    pub soft: Vec<String>,
    pub soft_needed: u32,
}

impl PrereqRequirements {
    /// Derives requirements from a node.
    pub fn from_node(node: &SpellNode) -> Self {
        if node.has_lock() {
            Self {
                hard: node.hard_prerequisites.clone(),
                soft: node.soft_prerequisites.clone(),
                soft_needed: node.soft_needed,
            }
        } else {
            Self {
                hard: node.prerequisites.clone(),
                soft: Vec::new(),
                soft_needed: 0,
            }
        }
    }

    /// True if the node has nothing to satisfy.
    pub fn is_empty(&self) -> bool {
        self.hard.is_empty() && self.soft.is_empty()
    }

    /// Checks the requirements against a set of mastered spell ids.
    pub fn is_met(&self, mastered: &HashSet<String>) -> bool {
        if self.is_empty() {
            return true;
        }

        if !self.hard.iter().all(|id| mastered.contains(id)) {
            return false;
        }

        if self.soft_needed > 0 && !self.soft.is_empty() {
            let (count, needed) = self.soft_status(mastered);
            if count < needed {
                return false;
            }
        }

        true
    }

    /// Hard prerequisites not yet mastered, in declaration order.
    pub fn unmet_hard<'a>(&'a self, mastered: &HashSet<String>) -> Vec<&'a str> {
        self.hard
            .iter()
            .filter(|id| !mastered.contains(*id))
            .map(String::as_str)
            .collect()
    }

    /// Returns `(mastered soft count, soft needed)`.
    pub fn soft_status(&self, mastered: &HashSet<String>) -> (u32, u32) {
        let count = self.soft.iter().filter(|id| mastered.contains(*id)).count() as u32;
        (count, self.soft_needed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mastered(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_legacy_list_is_all_hard() {
        let node = SpellNode::new("n", "Alteration", 2)
            .with_prerequisites(vec!["a".to_string(), "b".to_string()]);
        let reqs = node.requirements();

        assert_eq!(reqs.hard, vec!["a", "b"]);
        assert!(!reqs.is_met(&mastered(&["a"])));
        assert!(reqs.is_met(&mastered(&["a", "b"])));
        assert_eq!(reqs.unmet_hard(&mastered(&["b"])), vec!["a"]);
    }

    #[test]
    fn test_soft_quorum() {
        let mut node = SpellNode::new("n", "Alteration", 3);
        node.hard_prerequisites = vec!["h".to_string()];
        node.soft_prerequisites = vec!["s1".to_string(), "s2".to_string(), "s3".to_string()];
        node.soft_needed = 2;
        let reqs = node.requirements();

        assert!(!reqs.is_met(&mastered(&["h", "s1"])));
        assert!(reqs.is_met(&mastered(&["h", "s1", "s3"])));
        assert!(!reqs.is_met(&mastered(&["s1", "s2", "s3"])));
        assert_eq!(reqs.soft_status(&mastered(&["s2"])), (1, 2));
    }

    #[test]
    fn test_no_requirements_always_met() {
        let node = SpellNode::new("root", "Alteration", 0).as_root();
        assert!(node.requirements().is_met(&HashSet::new()));
    }
}
