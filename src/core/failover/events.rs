//! Controller inputs and outputs

use crate::core::health::ProbeReport;
use crate::core::orchestrator::{DeployOutcome, OrchestratorError};
use crate::core::registry::ProviderRegistry;
use std::sync::Arc;
use std::time::Duration;

/// Operator requests
#[derive(Debug, Clone)]
pub enum OperatorCommand {
    /// Start provisioning from Idle
    Deploy,
    /// Tear the deployment down and go Idle
    Teardown,
    /// Leave Failed and provision again
    Reset,
    /// Swap the provider registry
    Reload(Arc<ProviderRegistry>),
}

/// Everything the control loop feeds the controller, in arrival order
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// A probe completed and the provider's record was updated
    Probe(ProbeReport),
    /// Time passed for cost accrual of the active provider
    CostTick { elapsed: Duration },
    /// Externally observed accrued cost of a provider
    CostSample { provider: String, accrued: f64 },
    /// A new billing period started
    BillingPeriodReset,
    /// A failover timer fired
    FailoverTimerElapsed { token: u64 },
    /// A deploy requested by [`ControlAction::Deploy`] finished
    DeployFinished {
        provider: String,
        generation: u64,
        result: Result<DeployOutcome, OrchestratorError>,
    },
    Operator(OperatorCommand),
}

/// Side effects requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    /// Deploy to `provider`; report back with the same `generation`
    Deploy { provider: String, generation: u64 },
    /// Best-effort teardown; the result is only logged
    Teardown {
        provider: String,
        deployment_id: Option<String>,
    },
    /// Emit [`ControlEvent::FailoverTimerElapsed`] after `after`
    ScheduleFailoverTimer { token: u64, after: Duration },
    /// Save the current state
    Persist,
}
