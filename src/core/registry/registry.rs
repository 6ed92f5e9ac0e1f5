//! Registry implementation and hot-swappable handle

use super::error::RegistryError;
use super::types::Provider;
use crate::config::ProviderConfig;
use arc_swap::ArcSwap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Immutable set of providers, kept in ranking order
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
    index: HashMap<String, usize>,
}

impl ProviderRegistry {
    /// Build a registry, enforcing name uniqueness and the priority invariant
    pub fn new(mut providers: Vec<Provider>) -> Result<Self, RegistryError> {
        let mut priorities: HashMap<u32, &str> = HashMap::new();
        let mut names: HashSet<&str> = HashSet::new();

        for provider in &providers {
            if !names.insert(provider.name.as_str()) {
                return Err(RegistryError::DuplicateName(provider.name.clone()));
            }
            if provider.priority == 0 {
                return Err(RegistryError::InvalidProvider {
                    name: provider.name.clone(),
                    reason: "priority must be positive".to_string(),
                });
            }
            if !provider.cost_per_hour.is_finite()
                || provider.cost_per_hour < 0.0
                || !provider.cost_limit.is_finite()
                || provider.cost_limit < 0.0
            {
                return Err(RegistryError::InvalidProvider {
                    name: provider.name.clone(),
                    reason: "costs must be non-negative".to_string(),
                });
            }
            if provider.enabled {
                if let Some(first) = priorities.insert(provider.priority, &provider.name) {
                    return Err(RegistryError::DuplicatePriority {
                        priority: provider.priority,
                        first: first.to_string(),
                        second: provider.name.clone(),
                    });
                }
            }
        }

        providers.sort_by(|a, b| a.rank_cmp(b).then_with(|| a.name.cmp(&b.name)));
        let index = providers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();

        Ok(Self { providers, index })
    }

    /// Build a registry from provider configuration
    pub fn from_config(configs: &[ProviderConfig]) -> Result<Self, RegistryError> {
        Self::new(configs.iter().map(Provider::from).collect())
    }

    /// Enabled providers sorted by (cost_per_hour, priority)
    pub fn list_enabled(&self) -> Vec<&Provider> {
        self.providers.iter().filter(|p| p.enabled).collect()
    }

    /// All providers in ranking order, disabled included
    pub fn list_all(&self) -> &[Provider] {
        &self.providers
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Result<&Provider, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.providers[i])
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Shared handle to the current registry
///
/// Readers take a snapshot with [`RegistryHandle::load`]; a reload swaps the
/// whole registry atomically.
#[derive(Debug)]
pub struct RegistryHandle {
    current: ArcSwap<ProviderRegistry>,
}

impl RegistryHandle {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// Snapshot of the current registry
    pub fn load(&self) -> Arc<ProviderRegistry> {
        self.current.load_full()
    }

    /// Replace the registry
    pub fn reload(&self, registry: impl Into<Arc<ProviderRegistry>>) {
        let registry = registry.into();
        info!("Reloading provider registry ({} providers)", registry.len());
        self.current.store(registry);
    }
}
