//! Deployment descriptor
//!
//! The workload handed to a provider's deploy operation. The controller never
//! inspects it; it is serialized as-is into provider requests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Compute resources requested for the workload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default)]
    pub cpu_cores: u32,
    #[serde(default)]
    pub memory_gb: u32,
    #[serde(default)]
    pub storage_gb: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
}

/// Opaque deployment descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    /// Workload name
    #[serde(default = "default_workload_name")]
    pub name: String,
    /// Container image
    #[serde(default)]
    pub image: String,
    /// Startup command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Exposed ports
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Resource requirements
    #[serde(default)]
    pub resources: ResourceSpec,
    /// Restart policy
    #[serde(default = "default_restart_policy")]
    pub restart_policy: String,
}

impl Default for DeploymentDescriptor {
    fn default() -> Self {
        Self {
            name: default_workload_name(),
            image: String::new(),
            command: None,
            env: HashMap::new(),
            ports: Vec::new(),
            resources: ResourceSpec::default(),
            restart_policy: default_restart_policy(),
        }
    }
}

fn default_workload_name() -> String {
    "workload".to_string()
}

fn default_restart_policy() -> String {
    "always".to_string()
}
