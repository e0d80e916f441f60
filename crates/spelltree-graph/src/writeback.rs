//! Copies graph state back into raw records.
//!
//! Only structural fields are written. Everything else on a record
//! (positions, names, colors) stays exactly as it was loaded.

use crate::graph::SpellGraph;
use spelltree_core::{RawNode, RawTree, SpellNode};
use std::collections::HashSet;

impl SpellGraph {
    /// Writes prerequisites, children, lock lists, depth and root flags
    /// into `raw`. Returns the number of records updated.
    ///
    /// A record is updated only if it is the one the graph was built from:
    /// the first occurrence of its id, inside the school the node belongs
    /// to. Records of skipped schools and later duplicates are untouched.
    pub fn write_back(&self, raw: &mut RawTree) -> usize {
        let Some(schools) = raw.schools.as_mut() else {
            return 0;
        };

        let mut written: HashSet<String> = HashSet::new();
        for (name, school) in schools.iter_mut() {
            let Some(records) = school.nodes.as_mut() else {
                continue;
            };
            for record in records.iter_mut() {
                let Some(id) = record.id().map(str::to_string) else {
                    continue;
                };
                let Some(node) = self.get_by_id(&id) else {
                    continue;
                };
                if node.category != *name || written.contains(&id) {
                    continue;
                }
                apply(node, record);
                written.insert(id);
            }
        }
        written.len()
    }
}

fn apply(node: &SpellNode, record: &mut RawNode) {
    set_list(&mut record.prerequisites, &node.prerequisites);
    set_list(&mut record.children, &node.children);
    set_list(&mut record.hard_prereqs, &node.hard_prerequisites);
    set_list(&mut record.soft_prereqs, &node.soft_prerequisites);

    if record.soft_needed.is_some() || node.soft_needed > 0 {
        record.soft_needed = Some(node.soft_needed);
    }
    if record.is_root.is_some() || node.is_root {
        record.is_root = Some(node.is_root);
    }
    record.depth = node.depth;
}

/// Keeps absent lists absent unless the graph has something to say.
fn set_list(field: &mut Option<Vec<String>>, value: &[String]) {
    if field.is_some() || !value.is_empty() {
        *field = Some(value.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::GraphBuilder;
    use crate::depth::compute_all_depths;
    use spelltree_core::RawTree;

    const TREE: &str = r#"{
        "schools": {
            "Restoration": {
                "root": "r",
                "color": "gold",
                "nodes": [
                    { "formId": "r", "tier": 0, "x": 10, "y": 20 },
                    { "formId": "a", "tier": 1, "prerequisites": ["r"], "name": "Healing" },
                    { "formId": "a", "tier": 5, "name": "Shadow" }
                ]
            },
            "Broken": {
                "nodes": [ { "formId": "b", "tier": 1, "prerequisites": ["x"] } ]
            }
        }
    }"#;

    #[test]
    fn test_write_back_updates_structure_only() {
        let mut raw = RawTree::from_json(TREE).unwrap();
        let mut output = GraphBuilder::from_raw(&raw).unwrap();
        compute_all_depths(&mut output.graph);

        let written = output.graph.write_back(&mut raw);
        assert_eq!(written, 2);

        let schools = raw.schools.as_ref().unwrap();
        let nodes = schools["Restoration"].nodes.as_ref().unwrap();

        let root = &nodes[0];
        assert_eq!(root.children, Some(vec!["a".to_string()]));
        assert_eq!(root.prerequisites, None);
        assert_eq!(root.is_root, Some(true));
        assert_eq!(root.depth, Some(0));
        assert_eq!(root.extra["x"], 10);

        let healing = &nodes[1];
        assert_eq!(healing.depth, Some(1));
        assert_eq!(healing.is_root, None);
        assert_eq!(healing.extra["name"], "Healing");

        // The duplicate record keeps its loaded shape
        let shadow = &nodes[2];
        assert_eq!(shadow.depth, None);
        assert_eq!(shadow.prerequisites, None);

        assert_eq!(schools["Restoration"].extra["color"], "gold");
        let broken = &schools["Broken"].nodes.as_ref().unwrap()[0];
        assert_eq!(broken.prerequisites, Some(vec!["x".to_string()]));
    }

    #[test]
    fn test_write_back_clears_stale_depth() {
        let mut raw = RawTree::from_json(
            r#"{ "schools": { "S": { "root": "r", "nodes": [
                { "formId": "r", "tier": 0 },
                { "formId": "lost", "tier": 2, "depth": 4 }
            ] } } }"#,
        )
        .unwrap();
        let mut output = GraphBuilder::from_raw(&raw).unwrap();
        compute_all_depths(&mut output.graph);

        output.graph.write_back(&mut raw);

        let lost = &raw.schools.as_ref().unwrap()["S"].nodes.as_ref().unwrap()[1];
        assert_eq!(lost.depth, None);
    }
}
