//! Failover, orchestrator and deployment validators

use super::trait_def::Validate;
use crate::config::models::*;

impl Validate for FailoverConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failover_timeout_secs == 0 {
            return Err("Failover timeout must be greater than 0".to_string());
        }

        if self.health_check_interval_secs == 0 {
            return Err("Health check interval must be greater than 0".to_string());
        }

        if self.probe_timeout_secs == 0 {
            return Err("Probe timeout must be greater than 0".to_string());
        }

        if self.max_failover_attempts == 0 {
            return Err("Max failover attempts must be greater than 0".to_string());
        }

        if self.recovery_streak == 0 {
            return Err("Recovery streak must be greater than 0".to_string());
        }

        if self.failure_threshold < 2 {
            return Err("Failure threshold must be at least 2 consecutive failures".to_string());
        }

        if self.event_queue_capacity == 0 {
            return Err("Event queue capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for OrchestratorConfig {
    fn validate(&self) -> Result<(), String> {
        if self.call_timeout_secs == 0 {
            return Err("Orchestrator call timeout must be greater than 0".to_string());
        }

        if self.base_delay_ms == 0 {
            return Err("Retry base delay must be greater than 0".to_string());
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err("Retry max delay must not be less than base delay".to_string());
        }

        if self.backoff_multiplier < 1.0 {
            return Err("Retry backoff multiplier must be at least 1.0".to_string());
        }

        Ok(())
    }
}

impl Validate for DeploymentDescriptor {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Deployment name cannot be empty".to_string());
        }

        Ok(())
    }
}
