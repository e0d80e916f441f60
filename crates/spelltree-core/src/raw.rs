//! Raw tree schema.
//!
//! This is the loosely-typed shape tree generators and save files use.
//! Every structural field is optional here; the graph builder turns these
//! records into [`SpellNode`](crate::SpellNode)s and reports whatever is
//! missing. Fields the engine does not understand (positions, colors,
//! themes) are kept in `extra` so a load/save cycle never drops them.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A complete tree: one entry per school.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schools: Option<BTreeMap<String, RawSchool>>,

    /// Marks the input as externally validated; reconciliation is skipped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub trust_prereqs: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One school: its primary root and its node list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSchool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<RawNode>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One spell record as it appears in the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,

    #[serde(
        default,
        rename = "hardPrereqs",
        skip_serializing_if = "Option::is_none"
    )]
    pub hard_prereqs: Option<Vec<String>>,

    #[serde(
        default,
        rename = "softPrereqs",
        skip_serializing_if = "Option::is_none"
    )]
    pub soft_prereqs: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_needed: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_root: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,

    /// Pass-through fields (`x`, `y`, `name`, `theme`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawTree {
    /// Parses a tree from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the tree as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl RawNode {
    /// Creates a record with just an id and tier. Mostly useful in tests.
    pub fn new(form_id: impl Into<String>, tier: u32) -> Self {
        Self {
            form_id: Some(form_id.into()),
            tier: Some(tier),
            ..Self::default()
        }
    }

    /// The node's id: `formId`, falling back to `spellId`. Empty ids count
    /// as missing.
    pub fn id(&self) -> Option<&str> {
        self.form_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.spell_id.as_deref().filter(|id| !id.is_empty()))
    }
}
