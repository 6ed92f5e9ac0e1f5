//! Control loop
//!
//! One task owns the [`FailoverController`]. Probe loops (one per enabled
//! provider), the cost ticker, deploy calls and failover timers run as
//! separate tasks and report back through a bounded queue, which the loop
//! drains one event at a time.

use super::controller::FailoverController;
use super::events::{ControlAction, ControlEvent, OperatorCommand};
use super::state::{DeploymentPhase, DeploymentState, TransitionReason};
use crate::config::FailoverConfig;
use crate::core::health::{HealthBook, HealthProber};
use crate::core::orchestrator::DeploymentOrchestrator;
use crate::core::providers::ProviderSet;
use crate::core::registry::{ProviderRegistry, RegistryHandle};
use crate::core::selector::ProviderSelector;
use crate::storage::{StateSnapshot, StateStore};
use crate::utils::error::{FailoverError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Runs the failover controller against live providers
pub struct Supervisor {
    config: FailoverConfig,
    controller: FailoverController,
    prober: HealthProber,
    orchestrator: Arc<DeploymentOrchestrator>,
    store: Option<StateStore>,
    events_tx: mpsc::Sender<ControlEvent>,
    events_rx: mpsc::Receiver<ControlEvent>,
    state_tx: watch::Sender<DeploymentState>,
    probes: JoinSet<()>,
    cost_ticker: Option<JoinHandle<()>>,
    teardowns: JoinSet<()>,
}

impl Supervisor {
    pub fn new(
        config: FailoverConfig,
        registry: Arc<RegistryHandle>,
        health: Arc<HealthBook>,
        orchestrator: Arc<DeploymentOrchestrator>,
        store: Option<StateStore>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_capacity.max(1));
        let (state_tx, _) = watch::channel(DeploymentState::default());
        let prober = HealthProber::new(
            health.clone(),
            config.failure_threshold,
            config.recovery_streak,
        );
        let selector = ProviderSelector::new(registry, health);

        Self {
            controller: FailoverController::new(config.clone(), selector),
            config,
            prober,
            orchestrator,
            store,
            events_tx,
            events_rx,
            state_tx,
            probes: JoinSet::new(),
            cost_ticker: None,
            teardowns: JoinSet::new(),
        }
    }

    pub fn controller(&self) -> &FailoverController {
        &self.controller
    }

    /// Handle for feeding events into a running loop
    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            events: self.events_tx.clone(),
            state: self.state_tx.subscribe(),
            orchestrator: self.orchestrator.clone(),
        }
    }

    /// Adopt a persisted snapshot and issue whatever it requires
    pub async fn restore(&mut self, snapshot: StateSnapshot) {
        self.prober.book().restore(snapshot.health);
        let actions = self.controller.resume(snapshot.deployment, snapshot.costs);
        self.publish();
        self.execute(actions).await;
    }

    /// Apply an operator command immediately
    pub async fn command(&mut self, command: OperatorCommand) -> Result<()> {
        let actions = match command {
            OperatorCommand::Deploy => self.controller.request_deploy()?,
            OperatorCommand::Teardown => self.controller.teardown()?,
            OperatorCommand::Reset => self.controller.reset()?,
            OperatorCommand::Reload(registry) => {
                let actions = self.controller.reload_registry(registry);
                self.spawn_probes();
                actions
            }
        };
        self.execute(actions).await;
        Ok(())
    }

    /// Wait for outstanding teardowns
    pub async fn drain(&mut self) {
        while let Some(result) = self.teardowns.join_next().await {
            if let Err(e) = result {
                warn!("Teardown task ended abnormally: {}", e);
            }
        }
    }

    /// Run until `shutdown` resolves, the deployment is torn down or it fails
    ///
    /// Returns the final state; a Failed deployment is returned as the error
    /// that caused it.
    pub async fn run<F>(mut self, shutdown: F) -> Result<DeploymentState>
    where
        F: Future<Output = ()>,
    {
        info!("Control loop starting in phase {}", self.controller.phase());
        self.spawn_probes();
        self.spawn_cost_ticker();
        tokio::pin!(shutdown);

        let outcome = loop {
            match self.controller.phase() {
                DeploymentPhase::Failed => break Err(failure_error(self.controller.state())),
                DeploymentPhase::Idle => break Ok(()),
                _ => {}
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested; deployment left in phase {}", self.controller.phase());
                    break Ok(());
                }
                Some(result) = self.teardowns.join_next(), if !self.teardowns.is_empty() => {
                    if let Err(e) = result {
                        warn!("Teardown task ended abnormally: {}", e);
                    }
                }
                event = self.events_rx.recv() => {
                    let Some(event) = event else { break Ok(()) };
                    self.dispatch(event).await;
                }
            }
        };

        self.probes.abort_all();
        if let Some(ticker) = self.cost_ticker.take() {
            ticker.abort();
        }
        self.drain().await;
        self.persist().await;
        info!("Control loop stopped in phase {}", self.controller.phase());

        outcome.map(|_| self.controller.state().clone())
    }

    async fn dispatch(&mut self, event: ControlEvent) {
        let reload = matches!(event, ControlEvent::Operator(OperatorCommand::Reload(_)));
        let actions = self.controller.handle(event);
        if reload {
            self.spawn_probes();
        }
        self.execute(actions).await;
    }

    async fn execute(&mut self, actions: Vec<ControlAction>) {
        let mut persist = false;
        for action in actions {
            match action {
                ControlAction::Deploy {
                    provider,
                    generation,
                } => {
                    let orchestrator = self.orchestrator.clone();
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = orchestrator.deploy(&provider).await;
                        let event = ControlEvent::DeployFinished {
                            provider,
                            generation,
                            result,
                        };
                        if events.send(event).await.is_err() {
                            debug!("Control loop gone; dropping deploy result");
                        }
                    });
                }
                ControlAction::Teardown {
                    provider,
                    deployment_id,
                } => {
                    let orchestrator = self.orchestrator.clone();
                    self.teardowns.spawn(async move {
                        if let Err(e) = orchestrator
                            .teardown(&provider, deployment_id.as_deref())
                            .await
                        {
                            warn!("Best-effort teardown of {} failed: {}", provider, e);
                        }
                    });
                }
                ControlAction::ScheduleFailoverTimer { token, after } => {
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let event = ControlEvent::FailoverTimerElapsed { token };
                        if events.send(event).await.is_err() {
                            debug!("Control loop gone; dropping failover timer {}", token);
                        }
                    });
                }
                ControlAction::Persist => persist = true,
            }
        }

        if persist {
            self.persist().await;
        }
    }

    async fn persist(&self) {
        self.publish();
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = StateSnapshot::new(
            self.controller.state().clone(),
            self.prober.book().snapshot(),
            self.controller.costs().clone(),
        );
        if let Err(e) = store.save(&snapshot).await {
            error!("Failed to persist deployment state: {}", e);
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.controller.state().clone());
    }

    /// (Re)start one probe loop per enabled provider
    fn spawn_probes(&mut self) {
        self.probes.abort_all();

        let registry = self.controller.selector().registry();
        let interval = self.config.health_check_interval();
        let timeout = self.config.probe_timeout();

        for provider in registry.list_enabled() {
            let name = provider.name.clone();
            let prober = self.prober.clone();
            let orchestrator = self.orchestrator.clone();
            let events = self.events_tx.clone();

            self.probes.spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let Some(integration) = orchestrator.integration(&name) else {
                        warn!("No integration for provider {}, probing stopped", name);
                        return;
                    };
                    let report = prober.check(&name, integration.as_ref(), timeout).await;
                    if events.send(ControlEvent::Probe(report)).await.is_err() {
                        return;
                    }
                }
            });
        }
        debug!("Probing {} provider(s) every {:?}", registry.list_enabled().len(), interval);
    }

    /// Start the cost ticker; it outlives probe restarts on reload
    fn spawn_cost_ticker(&mut self) {
        if let Some(ticker) = self.cost_ticker.take() {
            ticker.abort();
        }
        let interval = self.config.health_check_interval();
        let events = self.events_tx.clone();

        self.cost_ticker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            let mut last = Instant::now();
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let elapsed = now.duration_since(last);
                last = now;
                if events.send(ControlEvent::CostTick { elapsed }).await.is_err() {
                    return;
                }
            }
        }));
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Some(ticker) = self.cost_ticker.take() {
            ticker.abort();
        }
    }
}

/// Error describing why a deployment is Failed
pub fn failure_error(state: &DeploymentState) -> FailoverError {
    let message = state
        .failure
        .clone()
        .unwrap_or_else(|| "deployment failed".to_string());
    match state.failed_reason() {
        Some(TransitionReason::NoViableProvider) => FailoverError::NoViableProvider(message),
        _ => FailoverError::DeploymentFailed(message),
    }
}

/// Cloneable handle to a running [`Supervisor`]
#[derive(Clone)]
pub struct SupervisorHandle {
    events: mpsc::Sender<ControlEvent>,
    state: watch::Receiver<DeploymentState>,
    orchestrator: Arc<DeploymentOrchestrator>,
}

impl SupervisorHandle {
    /// Queue an event for the control loop
    pub async fn send(&self, event: ControlEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| FailoverError::invalid_state("control loop is not running"))
    }

    /// Report an externally observed accrued cost
    pub async fn report_cost(&self, provider: &str, accrued: f64) -> Result<()> {
        self.send(ControlEvent::CostSample {
            provider: provider.to_string(),
            accrued,
        })
        .await
    }

    pub async fn reset_billing_period(&self) -> Result<()> {
        self.send(ControlEvent::BillingPeriodReset).await
    }

    pub async fn teardown(&self) -> Result<()> {
        self.send(ControlEvent::Operator(OperatorCommand::Teardown)).await
    }

    /// Swap in a new registry together with its provider integrations
    pub async fn reload(&self, registry: ProviderRegistry, providers: ProviderSet) -> Result<()> {
        self.orchestrator.replace_providers(providers);
        self.send(ControlEvent::Operator(OperatorCommand::Reload(Arc::new(
            registry,
        ))))
        .await
    }

    /// Latest published deployment state
    pub fn state(&self) -> DeploymentState {
        self.state.borrow().clone()
    }

    /// Wait until the deployment reaches `phase` or `timeout` passes
    pub async fn wait_for(&mut self, phase: DeploymentPhase, timeout: Duration) -> Result<DeploymentState> {
        let wait = self.state.wait_for(|state| state.phase == phase);
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(state)) => Ok(state.clone()),
            Ok(Err(_)) => Err(FailoverError::invalid_state("control loop is not running")),
            Err(_) => Err(FailoverError::invalid_state(format!(
                "deployment did not reach {} within {:?}",
                phase, timeout
            ))),
        }
    }
}
