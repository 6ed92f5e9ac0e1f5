//! Error types for the failover controller

use crate::core::orchestrator::OrchestratorError;
use crate::core::providers::ProviderError;
use crate::core::registry::RegistryError;
use thiserror::Error;

/// Result type alias for the failover controller
pub type Result<T> = std::result::Result<T, FailoverError>;

/// Main error type for the failover controller
#[derive(Error, Debug)]
pub enum FailoverError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Selection exhausted every candidate
    #[error("No viable provider: {0}")]
    NoViableProvider(String),

    /// Deploy or teardown failed after local recovery
    #[error("Deployment error: {0}")]
    Deploy(#[from] OrchestratorError),

    /// Failover attempts exhausted
    #[error("Deployment failed: {0}")]
    DeploymentFailed(String),

    /// Provider integration errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Operator request not valid in the current deployment phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Persisted state errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FailoverError {
    /// Process exit code for this failure class
    ///
    /// - `2` configuration error
    /// - `3` no viable provider
    /// - `4` deploy failure
    /// - `5` invalid operator request
    /// - `1` anything else
    pub fn exit_code(&self) -> u8 {
        match self {
            FailoverError::Config(_) | FailoverError::Yaml(_) | FailoverError::Registry(_) => 2,
            FailoverError::NoViableProvider(_) => 3,
            FailoverError::Deploy(_)
            | FailoverError::DeploymentFailed(_)
            | FailoverError::Provider(_) => 4,
            FailoverError::InvalidState(_) => 5,
            FailoverError::Serialization(_) | FailoverError::Io(_) | FailoverError::Storage(_) => 1,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        FailoverError::Config(message.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        FailoverError::InvalidState(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        FailoverError::Storage(message.into())
    }
}
