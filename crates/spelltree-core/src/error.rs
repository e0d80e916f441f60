//! Error types for tree loading and validation.

use std::io;
use thiserror::Error;

/// Errors that stop a whole tree from being processed.
///
/// Structural damage inside a tree (dangling references, orphans, cycles)
/// is never an error; it is repaired or reported as a diagnostic.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("tree has no schools map")]
    MissingSchools,

    #[error("invalid tree JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Config(String),
}

/// Why a single category was skipped during graph construction.
///
/// These are fatal to the category only; the rest of the batch proceeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("missing root node")]
    MissingRoot,

    #[error("no node list")]
    MissingNodes,

    #[error("root node {0} not in nodes list")]
    RootNotInNodes(String),

    #[error("root node {0} already belongs to another school")]
    DuplicateRoot(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
