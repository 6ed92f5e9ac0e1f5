//! Failover controller tests


use super::*;
use crate::config::FailoverConfig;
use crate::core::health::{
    HealthBook, HealthProber, ProbeError, ProbeReport, ProbeResult,
};
use crate::core::orchestrator::{DeployOutcome, OrchestratorError};
use crate::core::registry::{Provider, ProviderRegistry, ProviderTier, RegistryHandle};
use crate::core::selector::ProviderSelector;
use std::sync::Arc;
use std::time::Duration;

pub(super) fn config() -> FailoverConfig {
    FailoverConfig {
        failover_timeout_secs: 300,
        health_check_interval_secs: 60,
        max_failover_attempts: 3,
        recovery_streak: 3,
        failure_threshold: 2,
        probe_timeout_secs: 10,
        event_queue_capacity: 16,
    }
}

pub(super) fn provider(name: &str, priority: u32, cost: f64) -> Provider {
    Provider::new(name, ProviderTier::Secondary, priority, cost, 100.0)
}

/// Drives a controller by hand, playing the role of the control loop
pub(super) struct Harness {
    pub controller: FailoverController,
    pub prober: HealthProber,
    pub health: Arc<HealthBook>,
    pub registry: Arc<RegistryHandle>,
}

impl Harness {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self::with_config(providers, config())
    }

    pub fn with_config(providers: Vec<Provider>, config: FailoverConfig) -> Self {
        let registry = Arc::new(RegistryHandle::new(ProviderRegistry::new(providers).unwrap()));
        let health = Arc::new(HealthBook::new());
        let prober = HealthProber::new(health.clone(), config.failure_threshold, config.recovery_streak);
        let selector = ProviderSelector::new(registry.clone(), health.clone());
        Self {
            controller: FailoverController::new(config, selector),
            prober,
            health,
            registry,
        }
    }

    pub fn phase(&self) -> DeploymentPhase {
        self.controller.phase()
    }

    pub fn active(&self) -> Option<&str> {
        self.controller.state().active_provider.as_deref()
    }

    /// Record a probe result and hand it to the controller
    pub fn probe(&mut self, name: &str, healthy: bool) -> Vec<ControlAction> {
        let result = if healthy {
            ProbeResult::success(Duration::from_millis(5))
        } else {
            ProbeResult::failure(
                Duration::from_millis(5),
                ProbeError::Timeout(Duration::from_secs(10)),
            )
        };
        let report: ProbeReport = self.prober.record(name, result);
        self.controller.handle(ControlEvent::Probe(report))
    }

    /// Several probes in a row, returning every action produced
    pub fn probes(&mut self, name: &str, healthy: bool, count: u32) -> Vec<ControlAction> {
        (0..count).flat_map(|_| self.probe(name, healthy)).collect()
    }

    /// Complete the deploy requested in `actions` successfully
    pub fn deploy_ok(&mut self, actions: &[ControlAction]) -> Vec<ControlAction> {
        let (provider, generation) = deploy_of(actions).expect("no deploy requested");
        self.controller.handle(ControlEvent::DeployFinished {
            result: Ok(DeployOutcome {
                provider: provider.clone(),
                deployment_id: Some(format!("{}-1", provider)),
                endpoint: Some(format!("https://{}.example", provider)),
                attempts: 1,
            }),
            provider,
            generation,
        })
    }

    /// Fail the deploy requested in `actions`
    pub fn deploy_err(&mut self, actions: &[ControlAction], fatal: bool) -> Vec<ControlAction> {
        let (provider, generation) = deploy_of(actions).expect("no deploy requested");
        let err = if fatal {
            OrchestratorError::AuthFailure {
                provider: provider.clone(),
                message: "bad credentials".to_string(),
            }
        } else {
            OrchestratorError::Transient {
                provider: provider.clone(),
                attempts: 4,
                message: "connection reset".to_string(),
            }
        };
        self.controller.handle(ControlEvent::DeployFinished {
            provider,
            generation,
            result: Err(err),
        })
    }

    /// Fire the failover timer scheduled in `actions`
    pub fn fire_timer(&mut self, actions: &[ControlAction]) -> Vec<ControlAction> {
        let (token, _) = timer_of(actions).expect("no timer scheduled");
        self.controller
            .handle(ControlEvent::FailoverTimerElapsed { token })
    }

    /// Deploy from Idle and settle on the first pick
    pub fn start(&mut self) -> Vec<ControlAction> {
        let actions = self.controller.request_deploy().unwrap();
        self.deploy_ok(&actions)
    }

    /// Drive the active provider into Degraded, returning the actions
    pub fn degrade_active(&mut self) -> Vec<ControlAction> {
        let active = self.active().unwrap().to_string();
        let threshold = config().failure_threshold;
        self.probes(&active, false, threshold)
    }
}

pub(super) fn deploy_of(actions: &[ControlAction]) -> Option<(String, u64)> {
    actions.iter().find_map(|a| match a {
        ControlAction::Deploy {
            provider,
            generation,
        } => Some((provider.clone(), *generation)),
        _ => None,
    })
}

pub(super) fn timer_of(actions: &[ControlAction]) -> Option<(u64, Duration)> {
    actions.iter().find_map(|a| match a {
        ControlAction::ScheduleFailoverTimer { token, after } => Some((*token, *after)),
        _ => None,
    })
}

pub(super) fn teardowns(actions: &[ControlAction]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            ControlAction::Teardown { provider, .. } => Some(provider.clone()),
            _ => None,
        })
        .collect()
}

/// Teardowns in `actions` with the deployment id each one carries
pub(super) fn teardown_ids(actions: &[ControlAction]) -> Vec<(String, Option<String>)> {
    actions
        .iter()
        .filter_map(|a| match a {
            ControlAction::Teardown {
                provider,
                deployment_id,
            } => Some((provider.clone(), deployment_id.clone())),
            _ => None,
        })
        .collect()
}
