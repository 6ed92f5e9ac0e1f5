//! Cost ceiling evaluation

use crate::core::registry::Provider;
use serde::Serialize;

/// Result of a cost evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostVerdict {
    pub within_limit: bool,
    pub accrued: f64,
    pub limit: f64,
}

/// Stateless cost ceiling check
#[derive(Debug, Clone, Copy, Default)]
pub struct CostGuard;

impl CostGuard {
    /// Compare accrued cost with the provider's ceiling; reaching the limit
    /// exactly is still within it
    pub fn evaluate(provider: &Provider, accrued: f64) -> CostVerdict {
        CostVerdict {
            within_limit: accrued <= provider.cost_limit,
            accrued,
            limit: provider.cost_limit,
        }
    }
}
