//! Deployment state owned by the controller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Deployment lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPhase {
    /// Nothing requested, or torn down
    #[default]
    Idle,
    /// First deploy in progress
    Provisioning,
    Active,
    /// Active provider unhealthy or over its cost limit, failover timer armed
    Degraded,
    /// Switching providers
    FailingOver,
    /// New provider deployed, proving itself
    Recovering,
    /// Terminal until an operator reset
    Failed,
}

impl fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeploymentPhase::Idle => "idle",
            DeploymentPhase::Provisioning => "provisioning",
            DeploymentPhase::Active => "active",
            DeploymentPhase::Degraded => "degraded",
            DeploymentPhase::FailingOver => "failing_over",
            DeploymentPhase::Recovering => "recovering",
            DeploymentPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Why a transition happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    InitialDeploy,
    Unhealthy,
    CostLimitExceeded,
    ProviderDisabled,
    DeployFailed,
    StaleDeploy,
    VoluntaryFailback,
    OperatorTeardown,
    OperatorReset,
    NoViableProvider,
    AttemptsExhausted,
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransitionReason::InitialDeploy => "initial_deploy",
            TransitionReason::Unhealthy => "unhealthy",
            TransitionReason::CostLimitExceeded => "cost_limit_exceeded",
            TransitionReason::ProviderDisabled => "provider_disabled",
            TransitionReason::DeployFailed => "deploy_failed",
            TransitionReason::StaleDeploy => "stale_deploy",
            TransitionReason::VoluntaryFailback => "voluntary_failback",
            TransitionReason::OperatorTeardown => "operator_teardown",
            TransitionReason::OperatorReset => "operator_reset",
            TransitionReason::NoViableProvider => "no_viable_provider",
            TransitionReason::AttemptsExhausted => "attempts_exhausted",
        };
        f.write_str(label)
    }
}

/// One line of the failover log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub reason: TransitionReason,
}

/// An open failure episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverEpisode {
    pub started_at: DateTime<Utc>,
    /// What opened the episode
    pub reason: TransitionReason,
    /// Providers abandoned or tried during this episode
    pub excluded: BTreeSet<String>,
    /// Provider that was serving when the switch started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandoned: Option<String>,
}

impl FailoverEpisode {
    pub fn new(reason: TransitionReason) -> Self {
        Self {
            started_at: Utc::now(),
            reason,
            excluded: BTreeSet::new(),
            abandoned: None,
        }
    }
}

/// The single mutable deployment record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeploymentState {
    pub phase: DeploymentPhase,
    /// Provider currently serving the workload
    pub active_provider: Option<String>,
    /// Provider a deploy is in flight to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub attempt_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<FailoverEpisode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded_since: Option<DateTime<Utc>>,
    /// Last failure, set on entering Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Provider-issued deployment ids of workloads not yet torn down
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deployments: BTreeMap<String, String>,
    /// Append-only transition log
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl DeploymentState {
    pub fn record(&mut self, from: Option<String>, to: Option<String>, reason: TransitionReason) {
        self.history.push(HistoryEntry {
            at: Utc::now(),
            from,
            to,
            reason,
        });
    }

    /// Reason of the entry that put the deployment into Failed, if it is
    pub fn failed_reason(&self) -> Option<TransitionReason> {
        if self.phase != DeploymentPhase::Failed {
            return None;
        }
        self.history.last().map(|entry| entry.reason)
    }
}
