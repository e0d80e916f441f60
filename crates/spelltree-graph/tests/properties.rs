use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use spelltree_core::{InjectionConfig, RawNode, RawSchool, RawTree, RepairConfig};
use spelltree_graph::{
    inject_prerequisites, repair_all, simulate_unlocks, GraphBuilder, SpellGraph,
};
use std::collections::{BTreeMap, HashSet};

/// One generated record: tier, prerequisite indexes, child indexes, root flag.
/// Indexes past the node count become ids that do not exist.
type NodeSpec = (u32, Vec<usize>, Vec<usize>, bool);

fn arb_specs() -> impl Strategy<Value = Vec<NodeSpec>> {
    (2usize..12).prop_flat_map(|n| {
        prop::collection::vec(
            (
                0u32..5,
                prop::collection::vec(0..n + 2, 0..3),
                prop::collection::vec(0..n, 0..2),
                prop::bool::weighted(0.1),
            ),
            n,
        )
    })
}

fn id_for(index: usize, count: usize) -> String {
    if index < count {
        format!("n{}", index)
    } else {
        format!("ghost{}", index)
    }
}

fn raw_tree(specs: &[NodeSpec]) -> RawTree {
    let count = specs.len();
    let nodes = specs
        .iter()
        .enumerate()
        .map(|(i, (tier, prereqs, children, root))| {
            let mut node = RawNode::new(id_for(i, count), if i == 0 { 0 } else { *tier });
            node.prerequisites = Some(prereqs.iter().map(|&p| id_for(p, count)).collect());
            node.children = Some(children.iter().map(|&c| id_for(c, count)).collect());
            if *root && i > 0 {
                node.is_root = Some(true);
            }
            node
        })
        .collect();

    let school = RawSchool {
        root: Some("n0".to_string()),
        nodes: Some(nodes),
        ..RawSchool::default()
    };
    RawTree {
        schools: Some(BTreeMap::from([("Conjuration".to_string(), school)])),
        ..RawTree::default()
    }
}

fn build(specs: &[NodeSpec]) -> SpellGraph {
    GraphBuilder::from_raw(&raw_tree(specs)).unwrap().graph
}

fn edge_set(graph: &SpellGraph) -> HashSet<(String, String)> {
    graph
        .export_edges()
        .into_iter()
        .map(|e| (e.source, e.target))
        .collect()
}

fn assert_closure(graph: &SpellGraph) -> Result<(), TestCaseError> {
    for name in graph.category_names() {
        let unlocks = simulate_unlocks(graph, &name);
        for id in &unlocks.unlocked {
            if let Some(node) = graph.get_by_id(id) {
                for prereq in &node.prerequisites {
                    prop_assert!(unlocks.unlocked.contains(prereq), "{} unlocked before {}", id, prereq);
                }
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn roots_have_no_prerequisites(specs in arb_specs()) {
        let graph = build(&specs);
        let roots: HashSet<&str> = graph
            .nodes()
            .filter(|n| n.is_root)
            .map(|n| n.id.as_str())
            .collect();

        prop_assert!(roots.contains("n0"));
        for root in &roots {
            prop_assert!(graph.get_by_id(root).unwrap().prerequisites.is_empty());
        }
        for edge in graph.export_edges() {
            prop_assert!(!roots.contains(edge.target.as_str()));
        }
    }

    #[test]
    fn unlocked_set_is_closed(specs in arb_specs()) {
        let mut graph = build(&specs);
        assert_closure(&graph)?;
        repair_all(&mut graph, &RepairConfig::default());
        assert_closure(&graph)?;
    }

    #[test]
    fn second_repair_is_noop(specs in arb_specs()) {
        let mut graph = build(&specs);
        let config = RepairConfig::default();

        repair_all(&mut graph, &config);
        let second = repair_all(&mut graph, &config);

        prop_assert!(second.is_noop(), "second run: {:?}", second);
    }

    #[test]
    fn repair_leaves_no_dangling_references(specs in arb_specs()) {
        let mut graph = build(&specs);
        repair_all(&mut graph, &RepairConfig::default());

        for node in graph.nodes() {
            let lists = node
                .prerequisites
                .iter()
                .chain(&node.children)
                .chain(&node.hard_prerequisites)
                .chain(&node.soft_prerequisites);
            for id in lists {
                prop_assert!(graph.contains(id), "{} still references {}", node.id, id);
            }
        }
    }

    #[test]
    fn injection_only_adds_edges(specs in arb_specs(), seed in any::<u64>(), chance in 0u32..=100) {
        let mut graph = build(&specs);
        repair_all(&mut graph, &RepairConfig::default());
        let before = edge_set(&graph);
        let config = InjectionConfig { chance, ..InjectionConfig::default() };

        let report = inject_prerequisites(&mut graph, &config, &mut StdRng::seed_from_u64(seed));

        let after = edge_set(&graph);
        prop_assert!(before.is_subset(&after));
        prop_assert_eq!(after.len(), before.len() + report.added.len());
        assert_closure(&graph)?;
    }

    #[test]
    fn injected_edges_never_close_a_cycle(specs in arb_specs(), seed in any::<u64>()) {
        let mut graph = build(&specs);
        repair_all(&mut graph, &RepairConfig::default());
        let config = InjectionConfig {
            chance: 100,
            max_prerequisites: 4,
            min_tier: 0,
            same_tier_preference: false,
        };

        let report = inject_prerequisites(&mut graph, &config, &mut StdRng::seed_from_u64(seed));

        // A path back from target to source would make the new edge part of a cycle
        for (from, to) in &report.added {
            prop_assert!(!graph.descendants(to).contains(from), "{} -> {} closes a cycle", from, to);
        }
    }
}
