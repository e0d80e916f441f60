//! Engine configuration.
//!
//! Stored as `spelltree.json` next to the trees it applies to. Every field
//! has a default, so partial files are fine.

use crate::error::{Result, TreeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name `spelltree init` writes.
pub const CONFIG_FILE_NAME: &str = "spelltree.json";

/// Top-level configuration for the repair pipeline and the injector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub repair: RepairConfig,
    pub injection: InjectionConfig,
}

/// Settings for orphan reattachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepairConfig {
    /// Soft cap on children per reattachment target. Ignored when no
    /// candidate is under it.
    pub max_children_per_node: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_children_per_node: 3,
        }
    }
}

/// Settings for procedural prerequisite injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InjectionConfig {
    /// Per-node probability in percent (0-100).
    pub chance: u32,
    /// Nodes with this many prerequisites are left alone.
    pub max_prerequisites: usize,
    /// Nodes below this tier are left alone.
    pub min_tier: u32,
    /// Prefer candidates exactly one tier below the target.
    pub same_tier_preference: bool,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            chance: 50,
            max_prerequisites: 2,
            min_tier: 1,
            same_tier_preference: true,
        }
    }
}

impl EngineConfig {
    /// Loads a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Writes the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Rejects values the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.injection.chance > 100 {
            return Err(TreeError::Config(format!(
                "injection.chance must be 0-100, got {}",
                self.injection.chance
            )));
        }
        if self.repair.max_children_per_node == 0 {
            return Err(TreeError::Config(
                "repair.maxChildrenPerNode must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
