//! Sharded cache configuration

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default virtual nodes per cache node
pub const DEFAULT_REPLICAS: usize = 50;

/// Default entries per shard
pub const DEFAULT_SHARD_CAPACITY: usize = 1024;

/// Configuration for a [`crate::ShardedCache`]
///
/// Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    /// Ring positions per node
    pub replicas: usize,

    /// Maximum entries held by each node's shard (0 = unbounded)
    pub shard_capacity: usize,

    /// Initial node IDs
    pub nodes: Vec<String>,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            shard_capacity: DEFAULT_SHARD_CAPACITY,
            nodes: Vec::new(),
        }
    }
}

impl ShardConfig {
    /// Load a config from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the JSON file
    ///
    /// # Returns
    /// * `Result<ShardConfig>` - Validated config
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ShardConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check replica count and node IDs
    pub fn validate(&self) -> Result<()> {
        if self.replicas == 0 {
            return Err(Error::InvalidConfig("replicas must be at least 1".into()));
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.is_empty() {
                return Err(Error::InvalidConfig("node ID must not be empty".into()));
            }
            if !seen.insert(node.as_str()) {
                return Err(Error::DuplicateNode(node.clone()));
            }
        }

        Ok(())
    }
}
