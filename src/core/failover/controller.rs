//! Failover state machine

use super::events::{ControlAction, ControlEvent, OperatorCommand};
use super::state::{DeploymentPhase, DeploymentState, FailoverEpisode, TransitionReason};
use crate::config::FailoverConfig;
use crate::core::cost::CostLedger;
use crate::core::health::{HealthStatus, ProbeReport};
use crate::core::orchestrator::{DeployOutcome, OrchestratorError};
use crate::core::registry::ProviderRegistry;
use crate::core::selector::{Eligibility, ProviderSelector};
use crate::utils::error::{FailoverError, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeployPurpose {
    Initial,
    Failover,
    Failback,
}

#[derive(Debug, Clone)]
struct PendingDeploy {
    generation: u64,
    provider: String,
    purpose: DeployPurpose,
}

/// Owns [`DeploymentState`] and decides every transition
///
/// All methods are synchronous and side-effect free apart from mutating the
/// controller; required I/O is returned as [`ControlAction`]s.
#[derive(Debug)]
pub struct FailoverController {
    config: FailoverConfig,
    selector: ProviderSelector,
    state: DeploymentState,
    costs: CostLedger,
    pending: Option<PendingDeploy>,
    generation: u64,
    timer_token: u64,
    armed_timer: Option<u64>,
    /// Healthy probes of the new provider since it was deployed
    recovery_progress: u32,
    /// Healthy probes of the active provider while Active
    stable_progress: u32,
    /// Successes a failback candidate had when its last failback failed
    failback_floor: HashMap<String, u32>,
}

impl FailoverController {
    pub fn new(config: FailoverConfig, selector: ProviderSelector) -> Self {
        Self {
            config,
            selector,
            state: DeploymentState::default(),
            costs: CostLedger::new(),
            pending: None,
            generation: 0,
            timer_token: 0,
            armed_timer: None,
            recovery_progress: 0,
            stable_progress: 0,
            failback_floor: HashMap::new(),
        }
    }

    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    pub fn phase(&self) -> DeploymentPhase {
        self.state.phase
    }

    pub fn costs(&self) -> &CostLedger {
        &self.costs
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// Adopt a persisted state and continue from it
    ///
    /// Active and Recovering keep monitoring, Degraded re-arms its timer,
    /// Provisioning and FailingOver select again within the open episode.
    pub fn resume(&mut self, state: DeploymentState, costs: CostLedger) -> Vec<ControlAction> {
        self.state = state;
        self.costs = costs;
        self.pending = None;
        self.armed_timer = None;
        self.recovery_progress = 0;
        self.stable_progress = 0;
        self.state.target_provider = None;

        info!(
            "Resuming deployment in phase {} (active: {})",
            self.state.phase,
            self.state.active_provider.as_deref().unwrap_or("none")
        );

        match self.state.phase {
            DeploymentPhase::Idle
            | DeploymentPhase::Failed
            | DeploymentPhase::Active
            | DeploymentPhase::Recovering => Vec::new(),
            DeploymentPhase::Degraded => vec![self.arm_failover_timer()],
            DeploymentPhase::Provisioning => self.switch(false),
            DeploymentPhase::FailingOver => {
                if self.state.episode.is_some() {
                    self.switch(false)
                } else {
                    // An interrupted failback; the current provider never stopped
                    self.state.phase = DeploymentPhase::Active;
                    vec![ControlAction::Persist]
                }
            }
        }
    }

    /// Process one event
    pub fn handle(&mut self, event: ControlEvent) -> Vec<ControlAction> {
        match event {
            ControlEvent::Probe(report) => self.on_probe(&report),
            ControlEvent::CostTick { elapsed } => self.on_cost_tick(elapsed),
            ControlEvent::CostSample { provider, accrued } => {
                debug!("Cost sample for {}: {:.4}", provider, accrued);
                self.costs.record_sample(&provider, accrued);
                let mut actions = self.evaluate(None);
                actions.push(ControlAction::Persist);
                actions
            }
            ControlEvent::BillingPeriodReset => {
                info!("Billing period reset");
                self.costs.reset();
                let mut actions = self.evaluate(None);
                actions.push(ControlAction::Persist);
                actions
            }
            ControlEvent::FailoverTimerElapsed { token } => self.on_timer(token),
            ControlEvent::DeployFinished {
                provider,
                generation,
                result,
            } => self.on_deploy_finished(provider, generation, result),
            ControlEvent::Operator(command) => {
                let result = match command {
                    OperatorCommand::Deploy => self.request_deploy(),
                    OperatorCommand::Teardown => self.teardown(),
                    OperatorCommand::Reset => self.reset(),
                    OperatorCommand::Reload(registry) => Ok(self.reload_registry(registry)),
                };
                result.unwrap_or_else(|e| {
                    warn!("Operator request refused: {}", e);
                    Vec::new()
                })
            }
        }
    }

    /// Request provisioning; only valid while Idle
    pub fn request_deploy(&mut self) -> Result<Vec<ControlAction>> {
        match self.state.phase {
            DeploymentPhase::Idle => {
                info!("Deployment requested");
                self.state.attempt_count = 0;
                self.state.episode = None;
                self.state.failure = None;
                Ok(self.provision())
            }
            DeploymentPhase::Failed => Err(FailoverError::invalid_state(
                "deployment has failed; reset it first",
            )),
            phase => Err(FailoverError::invalid_state(format!(
                "deployment is already {}",
                phase
            ))),
        }
    }

    /// Tear the deployment down and go Idle; a no-op when already Idle
    pub fn teardown(&mut self) -> Result<Vec<ControlAction>> {
        if self.state.phase == DeploymentPhase::Idle {
            debug!("Teardown requested while idle");
            return Ok(Vec::new());
        }

        let mut targets = BTreeSet::new();
        targets.extend(self.state.active_provider.clone());
        targets.extend(self.state.target_provider.clone());
        targets.extend(self.pending.as_ref().map(|p| p.provider.clone()));
        targets.extend(self.state.deployments.keys().cloned());

        info!("Tearing down deployment ({} provider(s))", targets.len());

        let mut actions: Vec<ControlAction> = targets
            .into_iter()
            .map(|provider| self.teardown_action(provider))
            .collect();
        actions.push(ControlAction::Persist);

        let from = self.state.active_provider.clone();
        let history = std::mem::take(&mut self.state.history);
        self.state = DeploymentState {
            history,
            ..DeploymentState::default()
        };
        self.state.record(from, None, TransitionReason::OperatorTeardown);
        self.clear_progress();
        Ok(actions)
    }

    /// Leave Failed and provision again
    pub fn reset(&mut self) -> Result<Vec<ControlAction>> {
        if self.state.phase != DeploymentPhase::Failed {
            return Err(FailoverError::invalid_state(format!(
                "reset is only valid for a failed deployment (current: {})",
                self.state.phase
            )));
        }

        info!("Operator reset");
        self.state.attempt_count = 0;
        self.state.episode = None;
        self.state.failure = None;
        self.state.record(None, None, TransitionReason::OperatorReset);
        self.clear_progress();
        Ok(self.provision())
    }

    /// Swap the registry and re-check the active provider against it
    pub fn reload_registry(&mut self, registry: Arc<ProviderRegistry>) -> Vec<ControlAction> {
        let health = self.selector.health();
        health.retain(|name| registry.contains(name));
        self.selector.reload(registry);
        self.evaluate(None)
    }

    fn clear_progress(&mut self) {
        self.pending = None;
        self.armed_timer = None;
        self.recovery_progress = 0;
        self.stable_progress = 0;
    }

    fn provision(&mut self) -> Vec<ControlAction> {
        self.state.phase = DeploymentPhase::Provisioning;
        self.state.degraded_since = None;
        self.switch(false)
    }

    fn on_probe(&mut self, report: &ProbeReport) -> Vec<ControlAction> {
        if !report.result.healthy {
            self.failback_floor.remove(&report.provider);
        }
        self.evaluate(Some(report))
    }

    fn on_cost_tick(&mut self, elapsed: Duration) -> Vec<ControlAction> {
        let Some(active) = self.state.active_provider.clone() else {
            return Vec::new();
        };
        if self.state.phase == DeploymentPhase::Idle {
            return Vec::new();
        }

        let registry = self.selector.registry();
        if let Ok(provider) = registry.get(&active) {
            let total = self.costs.accrue(&active, provider.cost_per_hour, elapsed);
            debug!("Provider {} accrued {:.4} of {:.4}", active, total, provider.cost_limit);
        }

        let mut actions = self.evaluate(None);
        actions.push(ControlAction::Persist);
        actions
    }

    /// Re-check the active provider after anything it depends on changed
    fn evaluate(&mut self, report: Option<&ProbeReport>) -> Vec<ControlAction> {
        let Some(active) = self.state.active_provider.clone() else {
            return Vec::new();
        };
        let eligibility = self.selector.eligibility_of(&active, &self.costs);
        let probe = report
            .filter(|r| r.provider == active)
            .map(|r| r.result.healthy);

        match self.state.phase {
            DeploymentPhase::Active => {
                if !eligibility.is_eligible() {
                    return self.degrade(&active, reason_for(eligibility));
                }

                let mut actions = Vec::new();
                match probe {
                    Some(true) => {
                        self.stable_progress += 1;
                        if self.stable_progress >= self.config.recovery_streak
                            && self.state.attempt_count > 0
                        {
                            debug!("Provider {} stable, clearing attempt count", active);
                            self.state.attempt_count = 0;
                            actions.push(ControlAction::Persist);
                        }
                    }
                    Some(false) => self.stable_progress = 0,
                    None => {}
                }
                actions.extend(self.maybe_failback(&active));
                actions
            }
            DeploymentPhase::Degraded => {
                if eligibility.is_eligible() {
                    info!("Provider {} recovered before failover", active);
                    self.state.phase = DeploymentPhase::Active;
                    self.state.degraded_since = None;
                    self.armed_timer = None;
                    self.stable_progress = 0;
                    vec![ControlAction::Persist]
                } else {
                    Vec::new()
                }
            }
            DeploymentPhase::Recovering => {
                if !eligibility.is_eligible() {
                    warn!(
                        "Provider {} failed while recovering ({:?})",
                        active, eligibility
                    );
                    return self.fail_over(reason_for(eligibility));
                }
                match probe {
                    Some(true) => {
                        self.recovery_progress += 1;
                        if self.recovery_progress >= self.config.recovery_streak {
                            info!("Provider {} recovered, episode closed", active);
                            self.state.phase = DeploymentPhase::Active;
                            self.state.attempt_count = 0;
                            self.state.episode = None;
                            self.recovery_progress = 0;
                            self.stable_progress = 0;
                            return vec![ControlAction::Persist];
                        }
                    }
                    Some(false) => self.recovery_progress = 0,
                    None => {}
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn degrade(&mut self, active: &str, reason: TransitionReason) -> Vec<ControlAction> {
        warn!(
            "Active provider {} degraded ({}), failing over in {:?} unless it recovers",
            active,
            reason,
            self.config.failover_timeout()
        );
        self.state.phase = DeploymentPhase::Degraded;
        self.state.degraded_since = Some(chrono::Utc::now());
        self.stable_progress = 0;
        vec![self.arm_failover_timer(), ControlAction::Persist]
    }

    fn arm_failover_timer(&mut self) -> ControlAction {
        self.timer_token += 1;
        self.armed_timer = Some(self.timer_token);
        ControlAction::ScheduleFailoverTimer {
            token: self.timer_token,
            after: self.config.failover_timeout(),
        }
    }

    fn on_timer(&mut self, token: u64) -> Vec<ControlAction> {
        if self.armed_timer != Some(token) || self.state.phase != DeploymentPhase::Degraded {
            debug!("Ignoring stale failover timer {}", token);
            return Vec::new();
        }
        self.armed_timer = None;

        let Some(active) = self.state.active_provider.clone() else {
            return self.fail_over(TransitionReason::Unhealthy);
        };
        match self.selector.eligibility_of(&active, &self.costs) {
            Eligibility::Eligible => self.evaluate(None),
            eligibility => {
                warn!("Failover timeout elapsed for provider {}", active);
                self.fail_over(reason_for(eligibility))
            }
        }
    }

    /// Abandon the active provider and switch within the current episode
    fn fail_over(&mut self, reason: TransitionReason) -> Vec<ControlAction> {
        self.armed_timer = None;
        self.recovery_progress = 0;
        self.stable_progress = 0;

        let active = self.state.active_provider.clone();
        let episode = self
            .state
            .episode
            .get_or_insert_with(|| FailoverEpisode::new(reason));
        episode.excluded.extend(active);

        if self.state.phase != DeploymentPhase::Provisioning {
            self.state.phase = DeploymentPhase::FailingOver;
        }
        self.switch(true)
    }

    /// Select a provider within the open episode and deploy to it
    fn switch(&mut self, counts_attempt: bool) -> Vec<ControlAction> {
        let max_attempts = self.config.max_failover_attempts;
        if counts_attempt && self.state.attempt_count >= max_attempts {
            return self.enter_failed(
                TransitionReason::AttemptsExhausted,
                format!("{} failover attempts exhausted", max_attempts),
            );
        }

        let excluded = self
            .state
            .episode
            .as_ref()
            .map(|e| e.excluded.clone())
            .unwrap_or_default();

        let target = match self.selector.select(&excluded, &self.costs) {
            Ok(target) => target,
            Err(err) => return self.enter_failed(TransitionReason::NoViableProvider, err.to_string()),
        };

        if counts_attempt {
            self.state.attempt_count += 1;
        }

        let mut actions = Vec::new();
        let purpose = if self.state.phase == DeploymentPhase::Provisioning {
            DeployPurpose::Initial
        } else {
            DeployPurpose::Failover
        };

        if purpose == DeployPurpose::Failover {
            if let Some(old) = self.state.active_provider.take() {
                info!("Abandoning provider {}", old);
                if let Some(episode) = self.state.episode.as_mut() {
                    episode.abandoned = Some(old.clone());
                }
                self.state.endpoint = None;
                actions.push(self.teardown_action(old));
            }
        }

        actions.extend(self.start_deploy(target.name, purpose));
        actions
    }

    fn start_deploy(&mut self, provider: String, purpose: DeployPurpose) -> Vec<ControlAction> {
        self.generation += 1;
        info!(
            "Deploying to provider {} ({:?}, attempt {})",
            provider, purpose, self.state.attempt_count
        );
        self.state.target_provider = Some(provider.clone());
        self.pending = Some(PendingDeploy {
            generation: self.generation,
            provider: provider.clone(),
            purpose,
        });
        vec![
            ControlAction::Deploy {
                provider,
                generation: self.generation,
            },
            ControlAction::Persist,
        ]
    }

    fn maybe_failback(&mut self, active: &str) -> Vec<ControlAction> {
        if self.pending.is_some() {
            return Vec::new();
        }
        let registry = self.selector.registry();
        let Ok(current) = registry.get(active) else {
            return Vec::new();
        };

        let health = self.selector.health();
        for candidate in self.selector.rank(&BTreeSet::new(), &self.costs) {
            if !candidate.provider.outranks(current) {
                break;
            }
            if !candidate.eligibility.is_eligible() || candidate.health != HealthStatus::Healthy {
                continue;
            }
            if let Some(floor) = self.failback_floor.get(&candidate.provider.name) {
                let successes = health.get(&candidate.provider.name).consecutive_successes;
                if successes < floor.saturating_add(self.config.recovery_streak) {
                    continue;
                }
            }

            info!(
                "Preferred provider {} is healthy, failing back from {}",
                candidate.provider.name, active
            );
            self.state.phase = DeploymentPhase::FailingOver;
            return self.start_deploy(candidate.provider.name, DeployPurpose::Failback);
        }
        Vec::new()
    }

    fn on_deploy_finished(
        &mut self,
        provider: String,
        generation: u64,
        result: std::result::Result<DeployOutcome, OrchestratorError>,
    ) -> Vec<ControlAction> {
        let pending = match self.pending.take() {
            Some(pending) if pending.generation == generation => pending,
            other => {
                self.pending = other;
                debug!("Deploy result for {} from an abandoned attempt", provider);
                let in_use = self.state.active_provider.as_deref() == Some(provider.as_str())
                    || self.state.target_provider.as_deref() == Some(provider.as_str());
                return match result {
                    Ok(outcome) if !in_use => vec![ControlAction::Teardown {
                        provider,
                        deployment_id: outcome.deployment_id,
                    }],
                    _ => Vec::new(),
                };
            }
        };
        self.state.target_provider = None;

        match result {
            Ok(outcome) => self.on_deploy_succeeded(pending, outcome),
            Err(err) => self.on_deploy_failed(pending, err),
        }
    }

    fn on_deploy_succeeded(&mut self, pending: PendingDeploy, outcome: DeployOutcome) -> Vec<ControlAction> {
        if let Some(id) = outcome.deployment_id {
            self.state.deployments.insert(pending.provider.clone(), id);
        }

        let eligibility = self.selector.eligibility_of(&pending.provider, &self.costs);
        if !eligibility.is_eligible() {
            warn!(
                "Deploy to {} succeeded but the provider is no longer viable ({:?})",
                pending.provider, eligibility
            );
            let mut actions = vec![self.teardown_action(pending.provider.clone())];
            match pending.purpose {
                DeployPurpose::Failback => actions.extend(self.abort_failback(&pending.provider)),
                DeployPurpose::Initial | DeployPurpose::Failover => {
                    self.state
                        .episode
                        .get_or_insert_with(|| FailoverEpisode::new(TransitionReason::StaleDeploy))
                        .excluded
                        .insert(pending.provider);
                    actions.extend(self.switch(true));
                }
            }
            return actions;
        }

        let mut actions = Vec::new();
        let to = Some(pending.provider.clone());
        match pending.purpose {
            DeployPurpose::Initial => {
                let previous = self.state.active_provider.take();
                if let Some(old) = previous.as_ref().filter(|old| **old != pending.provider) {
                    actions.push(self.teardown_action(old.clone()));
                }
                info!("Provider {} is active", pending.provider);
                self.state.phase = DeploymentPhase::Active;
                self.state.episode = None;
                self.state.record(previous, to, TransitionReason::InitialDeploy);
            }
            DeployPurpose::Failover => {
                let (from, reason) = self
                    .state
                    .episode
                    .as_ref()
                    .map(|e| (e.abandoned.clone(), e.reason))
                    .unwrap_or((None, TransitionReason::Unhealthy));
                info!("Failed over to provider {}, recovering", pending.provider);
                self.state.phase = DeploymentPhase::Recovering;
                self.state.record(from, to, reason);
            }
            DeployPurpose::Failback => {
                let from = self.state.active_provider.take();
                if let Some(old) = from.clone() {
                    actions.push(self.teardown_action(old));
                }
                info!("Failed back to provider {}, recovering", pending.provider);
                self.state.phase = DeploymentPhase::Recovering;
                self.state.record(from, to, TransitionReason::VoluntaryFailback);
            }
        }

        self.state.active_provider = Some(pending.provider);
        self.state.endpoint = outcome.endpoint;
        self.state.degraded_since = None;
        self.recovery_progress = 0;
        self.stable_progress = 0;
        actions.push(ControlAction::Persist);
        actions
    }

    fn on_deploy_failed(&mut self, pending: PendingDeploy, err: OrchestratorError) -> Vec<ControlAction> {
        if err.is_provider_fatal() {
            warn!("Provider {} is unusable for this episode: {}", pending.provider, err);
        } else {
            warn!("Deploy to {} failed: {}", pending.provider, err);
        }

        let mut actions = vec![self.teardown_action(pending.provider.clone())];
        match pending.purpose {
            DeployPurpose::Failback => actions.extend(self.abort_failback(&pending.provider)),
            DeployPurpose::Initial | DeployPurpose::Failover => {
                self.state
                    .episode
                    .get_or_insert_with(|| FailoverEpisode::new(TransitionReason::DeployFailed))
                    .excluded
                    .insert(pending.provider);
                actions.extend(self.switch(true));
            }
        }
        actions
    }

    /// Teardown of `provider`, carrying (and forgetting) its recorded deployment id
    fn teardown_action(&mut self, provider: String) -> ControlAction {
        let deployment_id = self.state.deployments.remove(&provider);
        ControlAction::Teardown {
            provider,
            deployment_id,
        }
    }

    /// Stay on the current provider; the candidate must re-earn its streak
    fn abort_failback(&mut self, candidate: &str) -> Vec<ControlAction> {
        let successes = self.selector.health().get(candidate).consecutive_successes;
        self.failback_floor.insert(candidate.to_string(), successes);
        self.state.phase = DeploymentPhase::Active;

        let mut actions = self.evaluate(None);
        actions.push(ControlAction::Persist);
        actions
    }

    fn enter_failed(&mut self, reason: TransitionReason, message: String) -> Vec<ControlAction> {
        error!("Deployment failed: {}", message);
        let from = self.state.active_provider.clone().or_else(|| {
            self.state
                .episode
                .as_ref()
                .and_then(|e| e.abandoned.clone())
        });
        self.state.phase = DeploymentPhase::Failed;
        self.state.target_provider = None;
        self.state.degraded_since = None;
        self.state.failure = Some(message);
        self.state.record(from, None, reason);
        self.clear_progress();
        vec![ControlAction::Persist]
    }
}

fn reason_for(eligibility: Eligibility) -> TransitionReason {
    match eligibility {
        Eligibility::OverCostLimit => TransitionReason::CostLimitExceeded,
        Eligibility::Disabled => TransitionReason::ProviderDisabled,
        Eligibility::Unhealthy | Eligibility::Excluded | Eligibility::Eligible => {
            TransitionReason::Unhealthy
        }
    }
}
