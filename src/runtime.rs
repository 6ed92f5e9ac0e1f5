//! Process wiring
//!
//! Builds the shared pieces (registry, health book, orchestrator, state
//! store) from a loaded [`Config`] and hands out supervisors over them.

use crate::config::Config;
use crate::core::failover::Supervisor;
use crate::core::health::HealthBook;
use crate::core::orchestrator::DeploymentOrchestrator;
use crate::core::providers::{ProviderSet, build_provider_set};
use crate::core::registry::{ProviderRegistry, RegistryHandle};
use crate::core::selector::ProviderSelector;
use crate::storage::{StateLock, StateSnapshot, StateStore};
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared components of one controller process
#[derive(Debug, Clone)]
pub struct Runtime {
    config: Config,
    registry: Arc<RegistryHandle>,
    health: Arc<HealthBook>,
    orchestrator: Arc<DeploymentOrchestrator>,
    store: Option<StateStore>,
}

impl Runtime {
    /// Build the runtime with the integrations named in `config`
    pub fn new(config: &Config) -> Result<Self> {
        let providers = build_provider_set(&config.providers)?;
        Self::with_providers(config.clone(), providers)
    }

    /// Build the runtime around caller-supplied integrations
    pub fn with_providers(config: Config, providers: ProviderSet) -> Result<Self> {
        let registry = ProviderRegistry::from_config(&config.providers)?;
        info!(
            "Registry loaded: {} provider(s), {} enabled",
            registry.len(),
            registry.list_enabled().len()
        );

        let orchestrator =
            DeploymentOrchestrator::new(providers, config.deployment.clone(), &config.orchestrator);
        let store = config
            .storage
            .persist
            .then(|| StateStore::new(config.storage.state_path.clone()));
        if store.is_none() {
            debug!("State persistence disabled");
        }

        Ok(Self {
            registry: Arc::new(RegistryHandle::new(registry)),
            health: Arc::new(HealthBook::new()),
            orchestrator: Arc::new(orchestrator),
            store,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> Arc<ProviderRegistry> {
        self.registry.load()
    }

    pub fn health(&self) -> &Arc<HealthBook> {
        &self.health
    }

    pub fn orchestrator(&self) -> &Arc<DeploymentOrchestrator> {
        &self.orchestrator
    }

    pub fn store(&self) -> Option<&StateStore> {
        self.store.as_ref()
    }

    /// Selector over the live registry and health book
    pub fn selector(&self) -> ProviderSelector {
        ProviderSelector::new(self.registry.clone(), self.health.clone())
    }

    /// A fresh control loop over this runtime's components
    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(
            self.config.failover.clone(),
            self.registry.clone(),
            self.health.clone(),
            self.orchestrator.clone(),
            self.store.clone(),
        )
    }

    /// Exclusive hold on the state file for commands that change the
    /// deployment; `None` when persistence is off
    pub fn lock_state(&self) -> Result<Option<StateLock>> {
        self.store.as_ref().map(StateStore::lock).transpose()
    }

    /// Persisted snapshot, or an empty one when persistence is off or no
    /// state was saved yet
    pub async fn load_snapshot(&self) -> Result<StateSnapshot> {
        match &self.store {
            Some(store) => store.load_or_default().await,
            None => Ok(StateSnapshot::default()),
        }
    }

    /// Swap in a reloaded configuration's provider list
    ///
    /// Returns the new registry and integrations for the running control
    /// loop; the live handle itself is swapped by the controller.
    pub fn reload_providers(&self, config: &Config) -> Result<(ProviderRegistry, ProviderSet)> {
        let registry = ProviderRegistry::from_config(&config.providers)?;
        let providers = build_provider_set(&config.providers)?;
        info!("Reloaded provider list: {} provider(s)", registry.len());
        Ok((registry, providers))
    }
}
