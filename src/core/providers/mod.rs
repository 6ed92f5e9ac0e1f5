//! Provider integrations
//!
//! The controller talks to every compute provider through the
//! [`ComputeProvider`] trait: a liveness check plus deploy/teardown of the
//! workload. Concrete integrations live in submodules.

pub mod error;
pub mod http;
pub mod local;

pub use error::ProviderError;
pub use http::HttpProvider;
pub use local::LocalProvider;

#[cfg(test)]
pub use self::MockComputeProvider as MockProvider;

use crate::config::{DeploymentDescriptor, ProviderConfig, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a successful deploy call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeployReceipt {
    /// Provider-side deployment identifier, when the provider issues one
    pub deployment_id: Option<String>,
    /// Public endpoint of the running workload
    pub endpoint: Option<String>,
}

/// Provider integration seam
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Liveness check; `Ok` means the provider can serve the workload
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Create or replace the workload on this provider
    async fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<DeployReceipt, ProviderError>;

    /// Remove the workload; succeeds when nothing is deployed
    ///
    /// `deployment_id` is the identifier a previous [`deploy`](Self::deploy)
    /// returned, when the caller kept it.
    async fn teardown(&self, deployment_id: Option<String>) -> Result<(), ProviderError>;
}

/// Provider integrations keyed by provider name
pub type ProviderSet = HashMap<String, Arc<dyn ComputeProvider>>;

/// Build integrations for every configured provider
pub fn build_provider_set(configs: &[ProviderConfig]) -> Result<ProviderSet, ProviderError> {
    let mut set: ProviderSet = HashMap::with_capacity(configs.len());
    for config in configs {
        let provider: Arc<dyn ComputeProvider> = match config.kind {
            ProviderKind::Http => Arc::new(HttpProvider::from_config(config)?),
            ProviderKind::Local => Arc::new(LocalProvider::new(&config.name)),
        };
        set.insert(config.name.clone(), provider);
    }
    Ok(set)
}
