//! Edge types for the prerequisite graph.
//!
//! An edge `from -> to` means `from` is a prerequisite of `to`. The kind
//! records where the edge came from, so editors can tell authored content
//! apart from links the engine added.

use serde::{Deserialize, Serialize};

/// Origin of a prerequisite edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Listed in the input's prerequisite list.
    Authored,

    /// Only present as a child reference in the input; the builder
    /// derived the matching prerequisite.
    Derived,

    /// Added by orphan repair to reattach a subtree.
    Repair,

    /// Added by the procedural injector.
    Injected,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authored => "authored",
            Self::Derived => "derived",
            Self::Repair => "repair",
            Self::Injected => "injected",
        };
        write!(f, "{}", s)
    }
}

/// Edge weight stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
}

impl Edge {
    /// Creates a new edge.
    pub fn new(kind: EdgeKind) -> Self {
        Self { kind }
    }
}

/// A flattened edge for export and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}
