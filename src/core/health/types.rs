//! Health types

use crate::core::providers::ProviderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Debounced provider health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Not enough probes yet to decide
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(label)
    }
}

/// Why a probe failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub healthy: bool,
    pub latency: Duration,
    pub error: Option<ProbeError>,
}

impl ProbeResult {
    pub fn success(latency: Duration) -> Self {
        Self {
            healthy: true,
            latency,
            error: None,
        }
    }

    pub fn failure(latency: Duration, error: ProbeError) -> Self {
        Self {
            healthy: false,
            latency,
            error: Some(error),
        }
    }
}

/// Per-provider health record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub last_check_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl HealthRecord {
    /// Fold one probe result into the record
    ///
    /// A provider only becomes unhealthy after `failure_threshold` consecutive
    /// failures and only becomes healthy after `recovery_streak` consecutive
    /// successes. In between, the previous status is kept.
    pub fn apply(&mut self, result: &ProbeResult, failure_threshold: u32, recovery_streak: u32) {
        self.last_check_at = Some(Utc::now());
        self.last_latency_ms = Some(result.latency.as_millis() as u64);

        if result.healthy {
            self.consecutive_successes = self.consecutive_successes.saturating_add(1);
            self.consecutive_failures = 0;
            self.last_error = None;
            if self.consecutive_successes >= recovery_streak {
                self.status = HealthStatus::Healthy;
            }
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            self.consecutive_successes = 0;
            self.last_error = result.error.as_ref().map(|e| e.to_string());
            if self.consecutive_failures >= failure_threshold {
                self.status = HealthStatus::Unhealthy;
            }
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    pub fn is_unhealthy(&self) -> bool {
        self.status == HealthStatus::Unhealthy
    }
}

/// A probe outcome together with the record it produced
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub provider: String,
    pub result: ProbeResult,
    pub record: HealthRecord,
}
