//! Spelltree Graph - prerequisite graph engine
//!
//! This crate turns raw school/node lists into a prerequisite graph and
//! keeps it healthy. It answers which spells can actually be learned,
//! reconnects orphaned subtrees, computes depth layers, and can add extra
//! prerequisites for variety without breaking anything.
//!
//! # Architecture
//!
//! The graph uses petgraph internally with additional indexes for:
//! - Id-based lookups
//! - Per-school grouping (root, element roots, input order)
//!
//! Each node also carries its own `prerequisites`/`children` lists, which
//! are what gets written back to disk.
//!
//! # Example
//!
//! ```no_run
//! use spelltree_core::{EngineConfig, RawTree};
//! use spelltree_graph::prepare_tree;
//!
//! let raw = RawTree::from_json(r#"{ "schools": {} }"#).unwrap();
//! let prepared = prepare_tree(&raw, &EngineConfig::default()).unwrap();
//!
//! // Query the graph
//! println!("{}", prepared.diagnostics.summary());
//! ```

mod builder;
mod depth;
mod diagnostics;
mod edge;
mod graph;
mod inject;
mod pipeline;
mod reachability;
mod repair;
mod writeback;

pub use builder::{BuildOutput, GraphBuilder, SkippedCategory};
pub use depth::{compute_all_depths, compute_depths, DepthReport};
pub use diagnostics::{diagnose, diagnose_category, CategoryDiagnostics, TreeDiagnostics};
pub use edge::{Edge, EdgeKind, GraphEdge};
pub use graph::{CategoryGraph, GraphExport, GraphStats, NodeId, SpellGraph};
pub use inject::{inject_prerequisites, is_root_connected, InjectionReport, ROOT_PATH_ITERATION_CAP};
pub use pipeline::{prepare_tree, PreparedTree};
pub use reachability::{
    simulate_unlocks, LockedNode, Reachability, EXAMPLE_CHAIN_LIMIT, PASS_CAP_SLACK,
};
pub use repair::{repair_all, repair_category, RepairReport};
