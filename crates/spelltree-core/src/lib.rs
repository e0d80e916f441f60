//! Spelltree Core - The spell node model
//!
//! This crate defines the data every other Spelltree crate works with:
//! typed spell nodes, the raw tree schema produced by tree generators and
//! save files, the hard/soft prerequisite rules, and engine configuration.
//!
//! Raw trees are loosely structured JSON. They are validated once, at the
//! graph builder boundary, into [`SpellNode`] records; nothing downstream
//! checks for optional fields again.
//!
//! # Example
//!
//! ```
//! use spelltree_core::RawTree;
//!
//! let raw = RawTree::from_json(r#"{
//!     "schools": {
//!         "Destruction": {
//!             "root": "R",
//!             "nodes": [
//!                 { "formId": "R", "tier": 0 },
//!                 { "formId": "Y", "tier": 1, "prerequisites": ["R"] }
//!             ]
//!         }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(raw.schools.unwrap()["Destruction"].nodes.as_ref().unwrap().len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod raw;
pub mod requirements;

pub use config::{EngineConfig, InjectionConfig, RepairConfig};
pub use error::{CategoryError, Result, TreeError};
pub use node::SpellNode;
pub use raw::{RawNode, RawSchool, RawTree};
pub use requirements::PrereqRequirements;
