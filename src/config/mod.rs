//! Configuration management for the failover controller
//!
//! This module handles loading, environment overrides and validation of the
//! provider list and failover policy. Configuration is loaded once at process
//! start; a reload is a full swap of the provider registry.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{FailoverError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/failover.yaml";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Candidate providers
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Failover policy
    #[serde(default)]
    pub failover: FailoverConfig,
    /// Deploy/teardown call policy
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Workload handed to providers
    #[serde(default)]
    pub deployment: DeploymentDescriptor,
    /// Persisted state
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, apply environment overrides and validate
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            FailoverError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::parse_yaml(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate a YAML document, without environment overrides
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config = Self::parse_yaml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| FailoverError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply environment overrides
    ///
    /// Recognised keys: `FAILOVER_TIMEOUT`, `HEALTH_CHECK_INTERVAL`,
    /// `MAX_FAILOVER_ATTEMPTS`, `RECOVERY_STREAK`, `FAILOVER_STATE_PATH`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("FAILOVER_TIMEOUT") {
            self.failover.failover_timeout_secs = parse_env("FAILOVER_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("HEALTH_CHECK_INTERVAL") {
            self.failover.health_check_interval_secs = parse_env("HEALTH_CHECK_INTERVAL", &value)?;
        }
        if let Some(value) = lookup("MAX_FAILOVER_ATTEMPTS") {
            self.failover.max_failover_attempts = parse_env("MAX_FAILOVER_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("RECOVERY_STREAK") {
            self.failover.recovery_streak = parse_env("RECOVERY_STREAK", &value)?;
        }
        if let Some(value) = lookup("FAILOVER_STATE_PATH") {
            self.storage.state_path = value.into();
        }
        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.providers
            .as_slice()
            .validate()
            .map_err(|e| FailoverError::Config(format!("Provider config error: {}", e)))?;

        self.failover
            .validate()
            .map_err(|e| FailoverError::Config(format!("Failover config error: {}", e)))?;

        self.orchestrator
            .validate()
            .map_err(|e| FailoverError::Config(format!("Orchestrator config error: {}", e)))?;

        self.deployment
            .validate()
            .map_err(|e| FailoverError::Config(format!("Deployment config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            FailoverError::Config(format!("Failed to serialize config to YAML: {}", e))
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| FailoverError::Config(format!("Invalid {}: {}", key, e)))
}
