//! Orchestrator implementation

use super::error::OrchestratorError;
use crate::config::{DeploymentDescriptor, OrchestratorConfig};
use crate::core::providers::{ComputeProvider, ProviderError, ProviderSet};
use crate::utils::error::RetryPolicy;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A successful deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployOutcome {
    pub provider: String,
    pub deployment_id: Option<String>,
    pub endpoint: Option<String>,
    pub attempts: u32,
}

/// Deploys the workload to providers and removes it again
pub struct DeploymentOrchestrator {
    providers: ArcSwap<ProviderSet>,
    descriptor: DeploymentDescriptor,
    call_timeout: Duration,
    retry: RetryPolicy,
}

impl std::fmt::Debug for DeploymentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers = self.providers.load();
        let mut names: Vec<&String> = providers.keys().collect();
        names.sort();
        f.debug_struct("DeploymentOrchestrator")
            .field("providers", &names)
            .field("workload", &self.descriptor.name)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl DeploymentOrchestrator {
    pub fn new(
        providers: ProviderSet,
        descriptor: DeploymentDescriptor,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            providers: ArcSwap::from_pointee(providers),
            descriptor,
            call_timeout: config.call_timeout(),
            retry: RetryPolicy::new(config.retry_config()),
        }
    }

    /// Replace provider integrations after a registry reload
    pub fn replace_providers(&self, providers: ProviderSet) {
        self.providers.store(Arc::new(providers));
    }

    pub fn descriptor(&self) -> &DeploymentDescriptor {
        &self.descriptor
    }

    /// Integration registered under `name`
    pub fn integration(&self, name: &str) -> Option<Arc<dyn ComputeProvider>> {
        self.providers.load().get(name).cloned()
    }

    fn provider(&self, name: &str) -> Result<Arc<dyn ComputeProvider>, OrchestratorError> {
        self.integration(name)
            .ok_or_else(|| OrchestratorError::UnknownProvider(name.to_string()))
    }

    /// Deploy the workload to `name`
    pub async fn deploy(&self, name: &str) -> Result<DeployOutcome, OrchestratorError> {
        let provider = self.provider(name)?;
        info!("Deploying {} to provider {}", self.descriptor.name, name);

        let timeout = self.call_timeout;
        let descriptor = &self.descriptor;
        let result = self
            .retry
            .call(
                || {
                    let provider = provider.clone();
                    async move {
                        match tokio::time::timeout(timeout, provider.deploy(descriptor)).await {
                            Ok(result) => result,
                            Err(_) => Err(ProviderError::timeout(name, timeout)),
                        }
                    }
                },
                ProviderError::is_retryable,
            )
            .await;

        match result {
            Ok(done) => {
                info!(
                    "Deployed to {} after {} attempt(s){}",
                    name,
                    done.attempts,
                    done.value
                        .endpoint
                        .as_deref()
                        .map(|e| format!(", endpoint {}", e))
                        .unwrap_or_default()
                );
                Ok(DeployOutcome {
                    provider: name.to_string(),
                    deployment_id: done.value.deployment_id,
                    endpoint: done.value.endpoint,
                    attempts: done.attempts,
                })
            }
            Err(failed) => {
                let err =
                    OrchestratorError::from_provider(name, failed.value, failed.attempts, timeout);
                warn!("Deploy to {} failed: {}", name, err);
                Err(err)
            }
        }
    }

    /// Remove the workload from `name`
    ///
    /// `deployment_id` is the id recorded when the workload was deployed, if
    /// known. Idempotent; failures are returned for logging and never retried
    /// past the policy's budget.
    pub async fn teardown(
        &self,
        name: &str,
        deployment_id: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        let provider = self.provider(name)?;
        info!(
            "Tearing down {} on provider {} (deployment {})",
            self.descriptor.name,
            name,
            deployment_id.unwrap_or("unknown")
        );

        let timeout = self.call_timeout;
        let result = self
            .retry
            .call(
                || {
                    let provider = provider.clone();
                    let deployment_id = deployment_id.map(str::to_string);
                    async move {
                        match tokio::time::timeout(timeout, provider.teardown(deployment_id)).await {
                            Ok(result) => result,
                            Err(_) => Err(ProviderError::timeout(name, timeout)),
                        }
                    }
                },
                ProviderError::is_retryable,
            )
            .await;

        result.map(|_| ()).map_err(|failed| {
            let err = OrchestratorError::from_provider(name, failed.value, failed.attempts, timeout);
            warn!("Teardown of {} failed: {}", name, err);
            err
        })
    }
}
