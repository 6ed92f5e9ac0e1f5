//! In-process provider
//!
//! Always healthy and deploys instantly. Used for local development and for
//! dry runs of a configuration.

use super::{ComputeProvider, DeployReceipt, ProviderError};
use crate::config::DeploymentDescriptor;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// Local provider
#[derive(Debug)]
pub struct LocalProvider {
    name: String,
    deployed: Mutex<Option<String>>,
}

impl LocalProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deployed: Mutex::new(None),
        }
    }

    /// Name of the workload currently deployed, if any
    pub fn deployed(&self) -> Option<String> {
        self.deployed.lock().clone()
    }
}

#[async_trait]
impl ComputeProvider for LocalProvider {
    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<DeployReceipt, ProviderError> {
        info!("Local provider {} running {}", self.name, descriptor.name);
        *self.deployed.lock() = Some(descriptor.name.clone());
        Ok(DeployReceipt {
            deployment_id: Some(format!("{}-{}", self.name, descriptor.name)),
            endpoint: None,
        })
    }

    async fn teardown(&self, _deployment_id: Option<String>) -> Result<(), ProviderError> {
        if let Some(workload) = self.deployed.lock().take() {
            info!("Local provider {} stopped {}", self.name, workload);
        }
        Ok(())
    }
}
