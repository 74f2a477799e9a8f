use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shelf_gate::GateConfig;
use shelf_shard::ShardLayout;

use crate::error::{StoreError, StoreResult};

/// Configuration of one object store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of the store. Created on open if absent.
    pub base_dir: PathBuf,
    /// Shard width and alphabet. Must never change for an existing store.
    pub shard: ShardLayout,
    /// Gate wait bounds.
    pub gate: GateConfig,
    /// Pretty-print documents on disk.
    pub pretty_json: bool,
    /// `fsync` each record before it is renamed into place.
    pub fsync: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("storage"),
            shard: ShardLayout::default(),
            gate: GateConfig::default(),
            pretty_json: true,
            fsync: false,
        }
    }
}

impl StoreConfig {
    /// Default settings rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_shard(mut self, shard: ShardLayout) -> Self {
        self.shard = shard;
        self
    }

    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(StoreError::Configuration("base_dir must not be empty".into()));
        }
        self.shard.validate()?;
        self.gate.validate().map_err(StoreError::Configuration)?;
        Ok(())
    }
}
