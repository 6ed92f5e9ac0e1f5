//! Provider configuration

use super::*;
use crate::core::registry::ProviderTier;
use serde::{Deserialize, Serialize};

/// How a provider is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// REST compute API (deployments + health endpoint)
    #[default]
    Http,
    /// In-process provider, always healthy; for development and testing
    Local,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name
    pub name: String,
    /// Human-readable name used in reports
    #[serde(default)]
    pub display_name: Option<String>,
    /// Advisory tier (reporting only)
    #[serde(default)]
    pub tier: ProviderTier,
    /// Priority, lower is preferred; unique among enabled providers
    pub priority: u32,
    /// Cost per hour
    #[serde(default)]
    pub cost_per_hour: f64,
    /// Accrued cost ceiling for one billing period
    #[serde(default = "default_cost_limit")]
    pub cost_limit: f64,
    /// Operator toggle, independent of health
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Integration kind
    #[serde(default)]
    pub kind: ProviderKind,
    /// Base URL of the provider API (http providers)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API credential
    #[serde(default)]
    pub credentials_env: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: None,
            tier: ProviderTier::default(),
            priority: 1,
            cost_per_hour: 0.0,
            cost_limit: default_cost_limit(),
            enabled: true,
            kind: ProviderKind::default(),
            base_url: None,
            credentials_env: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Local provider configuration, mostly useful in tests
    pub fn local(name: &str, priority: u32, cost_per_hour: f64) -> Self {
        Self {
            name: name.to_string(),
            priority,
            cost_per_hour,
            kind: ProviderKind::Local,
            ..Default::default()
        }
    }
}

/// Default cost ceiling
pub fn default_cost_limit() -> f64 {
    100.0
}
