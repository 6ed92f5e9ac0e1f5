//! JSON state file

use crate::core::cost::CostLedger;
use crate::core::failover::DeploymentState;
use crate::core::health::HealthRecord;
use crate::utils::error::{FailoverError, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Everything persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub deployment: DeploymentState,
    #[serde(default)]
    pub health: BTreeMap<String, HealthRecord>,
    #[serde(default)]
    pub costs: CostLedger,
    pub saved_at: DateTime<Utc>,
}

impl StateSnapshot {
    pub fn new(
        deployment: DeploymentState,
        health: BTreeMap<String, HealthRecord>,
        costs: CostLedger,
    ) -> Self {
        Self {
            deployment,
            health,
            costs,
            saved_at: Utc::now(),
        }
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::new(DeploymentState::default(), BTreeMap::new(), CostLedger::new())
    }
}

/// State file on the local file system
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot; `None` when no state was ever saved
    pub async fn load(&self) -> Result<Option<StateSnapshot>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(FailoverError::storage(format!(
                    "Failed to read state file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let snapshot = serde_json::from_str(&content).map_err(|e| {
            FailoverError::storage(format!(
                "Corrupt state file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        info!("Loaded state from {}", self.path.display());
        Ok(Some(snapshot))
    }

    /// Load the snapshot or start from an empty one
    pub async fn load_or_default(&self) -> Result<StateSnapshot> {
        Ok(self.load().await?.unwrap_or_default())
    }

    /// Write the snapshot atomically (temporary file, then rename)
    pub async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                FailoverError::storage(format!("Failed to create state directory: {}", e))
            })?;
        }

        let content = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| FailoverError::storage(format!("Failed to create state file: {}", e)))?;
        file.write_all(&content)
            .await
            .map_err(|e| FailoverError::storage(format!("Failed to write state file: {}", e)))?;
        file.sync_all()
            .await
            .map_err(|e| FailoverError::storage(format!("Failed to sync state file: {}", e)))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| FailoverError::storage(format!("Failed to replace state file: {}", e)))?;

        debug!("State saved to {}", self.path.display());
        Ok(())
    }

    /// Path of the advisory lock file next to the state file
    pub fn lock_path(&self) -> PathBuf {
        let mut path = OsString::from(self.path.as_os_str());
        path.push(".lock");
        PathBuf::from(path)
    }

    /// Take the exclusive advisory lock on this state file
    ///
    /// Only one process may drive the deployment recorded here at a time;
    /// a held lock is reported as [`FailoverError::InvalidState`].
    pub fn lock(&self) -> Result<StateLock> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                FailoverError::storage(format!("Failed to create state directory: {}", e))
            })?;
        }

        let path = self.lock_path();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                FailoverError::storage(format!(
                    "Failed to open lock file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        if file.try_lock_exclusive().is_err() {
            let holder = std::fs::read_to_string(&path).unwrap_or_default();
            return Err(FailoverError::invalid_state(format!(
                "deployment state {} is held by another failover process{}",
                self.path.display(),
                match holder.trim() {
                    "" => String::new(),
                    pid => format!(" (pid {})", pid),
                }
            )));
        }

        // Holder pid, for the message above
        if file.set_len(0).is_ok() {
            let _ = write!(file, "{}", std::process::id());
        }
        debug!("Acquired state lock {}", path.display());
        Ok(StateLock { file, path })
    }
}

/// Exclusive hold on a state file; released on drop
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Failed to release state lock {}: {}", self.path.display(), e);
        }
    }
}
