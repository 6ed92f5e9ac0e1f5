//! Provider data model

use crate::config::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Advisory provider classification, used for reporting only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    Primary,
    #[default]
    Secondary,
    Backup,
}

impl fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderTier::Primary => "primary",
            ProviderTier::Secondary => "secondary",
            ProviderTier::Backup => "backup",
        };
        f.write_str(label)
    }
}

/// One deployment target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique name
    pub name: String,
    /// Advisory tier
    pub tier: ProviderTier,
    /// Lower is preferred; unique among enabled providers
    pub priority: u32,
    /// Cost per hour
    pub cost_per_hour: f64,
    /// Accrued cost ceiling above which the provider is disqualified
    pub cost_limit: f64,
    /// Operator toggle
    pub enabled: bool,
}

impl Provider {
    /// Create an enabled provider
    pub fn new(
        name: impl Into<String>,
        tier: ProviderTier,
        priority: u32,
        cost_per_hour: f64,
        cost_limit: f64,
    ) -> Self {
        Self {
            name: name.into(),
            tier,
            priority,
            cost_per_hour,
            cost_limit,
            enabled: true,
        }
    }

    /// Set the enabled flag (builder pattern)
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Ranking order: cost per hour ascending, then priority ascending
    pub fn rank_cmp(&self, other: &Provider) -> Ordering {
        self.cost_per_hour
            .total_cmp(&other.cost_per_hour)
            .then(self.priority.cmp(&other.priority))
    }

    /// True when `self` ranks strictly ahead of `other`
    pub fn outranks(&self, other: &Provider) -> bool {
        self.rank_cmp(other) == Ordering::Less
    }
}

impl From<&ProviderConfig> for Provider {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            tier: config.tier,
            priority: config.priority,
            cost_per_hour: config.cost_per_hour,
            cost_limit: config.cost_limit,
            enabled: config.enabled,
        }
    }
}
