use std::path::Path;

use serde::{Deserialize, Serialize};
use shelf_store::StoreConfig;

use crate::error::{ShelfError, ShelfResult};

/// Top-level configuration, usually loaded from a TOML file:
///
/// ```toml
/// [store]
/// base_dir = "/var/lib/shelf"
/// pretty_json = true
///
/// [store.shard]
/// width = 5
/// alphabet = "0123456789abcdefghijklmnopqrstuvwxyz"
///
/// [store.gate]
/// timeout_ms = 30000
/// poll_interval_ms = 500
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    pub store: StoreConfig,
}

impl ShelfConfig {
    pub fn new(store: StoreConfig) -> Self {
        Self { store }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> ShelfResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ShelfResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ShelfResult<String> {
        toml::to_string_pretty(self).map_err(|e| ShelfError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ShelfResult<()> {
        self.store.validate()?;
        Ok(())
    }
}
