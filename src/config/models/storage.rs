//! Persisted state configuration

use super::default_true;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the controller snapshot is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file path
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    /// Persist after every transition
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            persist: true,
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from("failover-state.json")
}
