//! Failover policy configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide failover policy, loaded once at start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// Seconds a provider may remain unhealthy before it is abandoned
    #[serde(default = "default_failover_timeout")]
    pub failover_timeout_secs: u64,
    /// Seconds between probes, per provider
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,
    /// Cap on forced switches within one failure episode
    #[serde(default = "default_max_failover_attempts")]
    pub max_failover_attempts: u32,
    /// Consecutive healthy probes required to (re)gain healthy status
    #[serde(default = "default_recovery_streak")]
    pub recovery_streak: u32,
    /// Consecutive failed probes required before a provider is unhealthy
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Timeout of a single probe in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Capacity of the control loop event queue
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            failover_timeout_secs: default_failover_timeout(),
            health_check_interval_secs: default_health_check_interval(),
            max_failover_attempts: default_max_failover_attempts(),
            recovery_streak: default_recovery_streak(),
            failure_threshold: default_failure_threshold(),
            probe_timeout_secs: default_probe_timeout(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

impl FailoverConfig {
    pub fn failover_timeout(&self) -> Duration {
        Duration::from_secs(self.failover_timeout_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_failover_timeout() -> u64 {
    300
}

fn default_health_check_interval() -> u64 {
    60
}

fn default_max_failover_attempts() -> u32 {
    3
}

fn default_recovery_streak() -> u32 {
    3
}

fn default_failure_threshold() -> u32 {
    2
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_event_queue_capacity() -> usize {
    256
}
