//! Build-and-repair pipeline.
//!
//! What an editor runs when a tree is loaded: build the graph, then for
//! each school check reachability, repair orphans, recompute depths and
//! check again. Injection is not part of this; it is user-triggered.

use crate::builder::{GraphBuilder, SkippedCategory};
use crate::depth::compute_depths;
use crate::diagnostics::{diagnose, TreeDiagnostics};
use crate::graph::SpellGraph;
use crate::reachability::{simulate_unlocks, EXAMPLE_CHAIN_LIMIT};
use crate::repair::{repair_category, RepairReport};
use spelltree_core::{EngineConfig, RawTree, Result};
use tracing::{info, warn};

/// A built, repaired tree and everything learned along the way.
#[derive(Debug)]
pub struct PreparedTree {
    pub graph: SpellGraph,
    pub seen_ids: Vec<String>,
    pub skipped: Vec<SkippedCategory>,
    pub duplicate_ids: Vec<String>,
    pub repair: RepairReport,
    /// Diagnostics after repair.
    pub diagnostics: TreeDiagnostics,
}

/// Builds and repairs a raw tree.
pub fn prepare_tree(raw: &RawTree, config: &EngineConfig) -> Result<PreparedTree> {
    let output = GraphBuilder::from_raw(raw)?;
    let mut graph = output.graph;
    let mut repair = RepairReport::default();

    for name in graph.category_names() {
        let before = simulate_unlocks(&graph, &name);
        if !before.is_complete() {
            warn!(
                "{}: {} unobtainable node(s) before repair",
                name,
                before.locked.len()
            );
        }

        repair.merge(repair_category(&mut graph, &name, &config.repair));
        compute_depths(&mut graph, &name);

        let after = simulate_unlocks(&graph, &name);
        if !after.is_complete() {
            warn!(
                "{}: {} node(s) still unobtainable after repair",
                name,
                after.locked.len()
            );
            for chain in after.blocking_chains(EXAMPLE_CHAIN_LIMIT) {
                warn!("{}: blocked by {}", name, chain.join(" <- "));
            }
        }
    }

    let diagnostics = diagnose(&graph, &config.repair);
    info!("Prepared {} nodes: {}", graph.node_count(), diagnostics.summary());

    Ok(PreparedTree {
        graph,
        seen_ids: output.seen_ids,
        skipped: output.skipped,
        duplicate_ids: output.duplicate_ids,
        repair,
        diagnostics,
    })
}
