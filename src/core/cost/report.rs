//! Cost projections for reporting

use crate::core::registry::{Provider, ProviderRegistry, ProviderTier};
use serde::Serialize;

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_MONTH: f64 = 30.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Projected running cost of one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostProjection {
    pub provider: String,
    pub tier: ProviderTier,
    pub priority: u32,
    pub hourly: f64,
    pub daily: f64,
    pub monthly: f64,
    pub yearly: f64,
    pub cost_limit: f64,
}

impl CostProjection {
    pub fn for_provider(provider: &Provider) -> Self {
        let hourly = provider.cost_per_hour;
        let daily = hourly * HOURS_PER_DAY;
        let monthly = daily * DAYS_PER_MONTH;
        Self {
            provider: provider.name.clone(),
            tier: provider.tier,
            priority: provider.priority,
            hourly,
            daily,
            monthly,
            yearly: monthly * MONTHS_PER_YEAR,
            cost_limit: provider.cost_limit,
        }
    }

    /// Projections for every enabled provider, cheapest first
    pub fn for_registry(registry: &ProviderRegistry) -> Vec<Self> {
        registry
            .list_enabled()
            .into_iter()
            .map(Self::for_provider)
            .collect()
    }
}
