//! Scriptable in-process providers

use async_trait::async_trait;
use failover_rs::config::DeploymentDescriptor;
use failover_rs::{ComputeProvider, DeployReceipt, ProviderError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Default)]
struct Switches {
    unhealthy: AtomicBool,
    reject_deploys: AtomicBool,
    deploys: AtomicU32,
    teardowns: AtomicU32,
    health_checks: AtomicU32,
}

/// Provider whose health and deploy outcome are flipped by the test
///
/// Clones share their switches, so a test can keep one clone while the
/// runtime owns another.
#[derive(Debug, Clone)]
pub struct ToggleProvider {
    name: String,
    switches: Arc<Switches>,
}

impl ToggleProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            switches: Arc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.switches.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn reject_deploys(&self, reject: bool) {
        self.switches.reject_deploys.store(reject, Ordering::SeqCst);
    }

    pub fn deploys(&self) -> u32 {
        self.switches.deploys.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> u32 {
        self.switches.teardowns.load(Ordering::SeqCst)
    }

    pub fn health_checks(&self) -> u32 {
        self.switches.health_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComputeProvider for ToggleProvider {
    async fn health_check(&self) -> Result<(), ProviderError> {
        self.switches.health_checks.fetch_add(1, Ordering::SeqCst);
        if self.switches.unhealthy.load(Ordering::SeqCst) {
            Err(ProviderError::unavailable(&self.name, "503 Service Unavailable"))
        } else {
            Ok(())
        }
    }

    async fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<DeployReceipt, ProviderError> {
        self.switches.deploys.fetch_add(1, Ordering::SeqCst);
        if self.switches.reject_deploys.load(Ordering::SeqCst) {
            return Err(ProviderError::rejected(&self.name, "image not allowed"));
        }
        Ok(DeployReceipt {
            deployment_id: Some(format!("{}-{}", self.name, self.deploys())),
            endpoint: Some(format!("https://{}.{}.example", descriptor.name, self.name)),
        })
    }

    async fn teardown(&self, _deployment_id: Option<String>) -> Result<(), ProviderError> {
        self.switches.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
