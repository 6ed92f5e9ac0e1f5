//! Accrued cost per provider

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Accrued cost for the current billing period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostLedger {
    accrued: BTreeMap<String, f64>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accrued cost of a provider, zero when never charged
    pub fn accrued(&self, provider: &str) -> f64 {
        self.accrued.get(provider).copied().unwrap_or(0.0)
    }

    /// Charge `cost_per_hour` for `elapsed`; returns the new total
    pub fn accrue(&mut self, provider: &str, cost_per_hour: f64, elapsed: Duration) -> f64 {
        let charge = cost_per_hour * elapsed.as_secs_f64() / 3600.0;
        let total = self.accrued.entry(provider.to_string()).or_insert(0.0);
        *total += charge;
        *total
    }

    /// Replace the accrued cost with an externally observed figure
    pub fn record_sample(&mut self, provider: &str, accrued: f64) {
        self.accrued.insert(provider.to_string(), accrued.max(0.0));
    }

    /// Start a new billing period
    pub fn reset(&mut self) {
        self.accrued.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.accrued.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
