//! Selector implementation

use super::error::SelectionError;
use crate::core::cost::{CostGuard, CostLedger, CostVerdict};
use crate::core::health::{HealthBook, HealthStatus};
use crate::core::registry::{Provider, ProviderRegistry, RegistryHandle};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Why a provider can or cannot be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    Disabled,
    Unhealthy,
    OverCostLimit,
    Excluded,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// A provider as seen by the selector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub provider: Provider,
    pub health: HealthStatus,
    pub cost: CostVerdict,
    pub eligibility: Eligibility,
}

/// Ranks providers and picks the best viable one
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    registry: Arc<RegistryHandle>,
    health: Arc<HealthBook>,
}

impl ProviderSelector {
    pub fn new(registry: Arc<RegistryHandle>, health: Arc<HealthBook>) -> Self {
        Self { registry, health }
    }

    pub fn registry(&self) -> Arc<ProviderRegistry> {
        self.registry.load()
    }

    pub fn health(&self) -> Arc<HealthBook> {
        self.health.clone()
    }

    /// Swap the registry behind this selector
    pub fn reload(&self, registry: Arc<ProviderRegistry>) {
        self.registry.reload(registry);
    }

    /// Highest-ranked enabled provider not in `exclude` that is not unhealthy
    /// and is within its cost limit
    pub fn select(
        &self,
        exclude: &BTreeSet<String>,
        costs: &CostLedger,
    ) -> Result<Provider, SelectionError> {
        let registry = self.registry.load();
        for provider in registry.list_enabled() {
            let eligibility = self.eligibility(provider, exclude, costs);
            if eligibility.is_eligible() {
                debug!("Selected provider {}", provider.name);
                return Ok(provider.clone());
            }
            debug!("Skipping provider {}: {:?}", provider.name, eligibility);
        }

        Err(SelectionError::NoViableProvider {
            excluded: exclude.iter().cloned().collect(),
        })
    }

    /// Every configured provider in ranking order with its eligibility
    pub fn rank(&self, exclude: &BTreeSet<String>, costs: &CostLedger) -> Vec<Candidate> {
        let registry = self.registry.load();
        registry
            .list_all()
            .iter()
            .map(|provider| Candidate {
                provider: provider.clone(),
                health: self.health.status(&provider.name),
                cost: CostGuard::evaluate(provider, costs.accrued(&provider.name)),
                eligibility: self.eligibility(provider, exclude, costs),
            })
            .collect()
    }

    /// Eligibility of a provider by name; unknown names are disabled
    pub fn eligibility_of(&self, name: &str, costs: &CostLedger) -> Eligibility {
        let registry = self.registry.load();
        match registry.get(name) {
            Ok(provider) => self.eligibility(provider, &BTreeSet::new(), costs),
            Err(_) => Eligibility::Disabled,
        }
    }

    fn eligibility(
        &self,
        provider: &Provider,
        exclude: &BTreeSet<String>,
        costs: &CostLedger,
    ) -> Eligibility {
        if !provider.enabled {
            Eligibility::Disabled
        } else if exclude.contains(&provider.name) {
            Eligibility::Excluded
        } else if self.health.status(&provider.name) == HealthStatus::Unhealthy {
            Eligibility::Unhealthy
        } else if !CostGuard::evaluate(provider, costs.accrued(&provider.name)).within_limit {
            Eligibility::OverCostLimit
        } else {
            Eligibility::Eligible
        }
    }
}
