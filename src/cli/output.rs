//! Output formatting for CLI commands

use crate::core::cost::CostProjection;
use crate::core::failover::{DeploymentPhase, DeploymentState, FailoverEpisode, HistoryEntry};
use crate::core::health::{HealthRecord, HealthStatus};
use crate::core::registry::ProviderTier;
use crate::core::selector::{Candidate, Eligibility};
use crate::utils::error::Result;
use serde::Serialize;
use std::fmt::Write;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Plain-text rendering of a report
pub trait Render {
    fn render_text(&self) -> String;
}

/// Format `data` for printing
pub fn format<T: Serialize + Render>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(data.render_text()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
    }
}

/// Print `data` in the specified format
pub fn print_output<T: Serialize + Render>(data: &T, output: OutputFormat) -> Result<()> {
    let text = format(data, output)?;
    println!("{}", text.trim_end());
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("✗ {}", message);
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// One provider in the status report
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub tier: ProviderTier,
    pub priority: u32,
    pub enabled: bool,
    pub cost_per_hour: f64,
    pub accrued: f64,
    pub cost_limit: f64,
    pub eligibility: Eligibility,
    pub health: HealthRecord,
}

impl ProviderStatus {
    pub fn new(candidate: Candidate, health: HealthRecord) -> Self {
        Self {
            name: candidate.provider.name,
            tier: candidate.provider.tier,
            priority: candidate.provider.priority,
            enabled: candidate.provider.enabled,
            cost_per_hour: candidate.provider.cost_per_hour,
            accrued: candidate.cost.accrued,
            cost_limit: candidate.cost.limit,
            eligibility: candidate.eligibility,
            health,
        }
    }
}

/// `status` command output
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub phase: DeploymentPhase,
    pub active_provider: Option<String>,
    pub target_provider: Option<String>,
    pub endpoint: Option<String>,
    pub attempt_count: u32,
    pub episode: Option<FailoverEpisode>,
    pub failure: Option<String>,
    /// Ranked best first
    pub providers: Vec<ProviderStatus>,
}

impl StatusReport {
    pub fn new(state: &DeploymentState, providers: Vec<ProviderStatus>) -> Self {
        Self {
            phase: state.phase,
            active_provider: state.active_provider.clone(),
            target_provider: state.target_provider.clone(),
            endpoint: state.endpoint.clone(),
            attempt_count: state.attempt_count,
            episode: state.episode.clone(),
            failure: state.failure.clone(),
            providers,
        }
    }
}

impl Render for StatusReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Phase:           {}", self.phase);
        let _ = writeln!(out, "Active provider: {}", or_dash(self.active_provider.as_deref()));
        if let Some(target) = &self.target_provider {
            let _ = writeln!(out, "Deploying to:    {}", target);
        }
        if let Some(endpoint) = &self.endpoint {
            let _ = writeln!(out, "Endpoint:        {}", endpoint);
        }
        let _ = writeln!(out, "Attempts:        {}", self.attempt_count);
        if let Some(episode) = &self.episode {
            let excluded: Vec<&str> = episode.excluded.iter().map(String::as_str).collect();
            let _ = writeln!(
                out,
                "Episode:         {} since {} (excluded: {})",
                episode.reason,
                episode.started_at.format("%Y-%m-%d %H:%M:%S"),
                if excluded.is_empty() { "-".to_string() } else { excluded.join(", ") }
            );
        }
        if let Some(failure) = &self.failure {
            let _ = writeln!(out, "Failure:         {}", failure);
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<16} {:<10} {:>4} {:>10} {:>10} {:>10} {:<10} {:<16} {}",
            "PROVIDER", "TIER", "PRIO", "COST/H", "ACCRUED", "LIMIT", "HEALTH", "ELIGIBILITY", "LAST CHECK"
        );
        for p in &self.providers {
            let last_check = p
                .health
                .last_check_at
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:<16} {:<10} {:>4} {:>10.4} {:>10.4} {:>10.2} {:<10} {:<16} {}",
                p.name,
                p.tier.to_string(),
                p.priority,
                p.cost_per_hour,
                p.accrued,
                p.cost_limit,
                health_label(&p.health),
                eligibility_label(p.eligibility),
                last_check
            );
            if let Some(error) = &p.health.last_error {
                let _ = writeln!(out, "{:<16} last error: {}", "", error);
            }
        }
        out
    }
}

fn health_label(record: &HealthRecord) -> String {
    match record.status {
        HealthStatus::Unhealthy => format!("unhealthy({})", record.consecutive_failures),
        status => status.to_string(),
    }
}

fn eligibility_label(eligibility: Eligibility) -> &'static str {
    match eligibility {
        Eligibility::Eligible => "eligible",
        Eligibility::Disabled => "disabled",
        Eligibility::Unhealthy => "unhealthy",
        Eligibility::OverCostLimit => "over_cost_limit",
        Eligibility::Excluded => "excluded",
    }
}

/// `history` command output
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct HistoryReport(pub Vec<HistoryEntry>);

impl Render for HistoryReport {
    fn render_text(&self) -> String {
        if self.0.is_empty() {
            return "No transitions recorded".to_string();
        }
        let mut out = String::new();
        for entry in &self.0 {
            let _ = writeln!(
                out,
                "{}  {:<16} -> {:<16} {}",
                entry.at.format("%Y-%m-%d %H:%M:%S"),
                or_dash(entry.from.as_deref()),
                or_dash(entry.to.as_deref()),
                entry.reason
            );
        }
        out
    }
}

/// One row of the `costs` report
#[derive(Debug, Clone, Serialize)]
pub struct CostRow {
    #[serde(flatten)]
    pub projection: CostProjection,
    /// Accrued in the current billing period
    pub accrued: f64,
}

/// `costs` command output
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CostReport(pub Vec<CostRow>);

impl Render for CostReport {
    fn render_text(&self) -> String {
        if self.0.is_empty() {
            return "No enabled providers".to_string();
        }
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<16} {:<10} {:>4} {:>10} {:>10} {:>10} {:>12} {:>10}",
            "PROVIDER", "TIER", "PRIO", "HOURLY", "DAILY", "MONTHLY", "YEARLY", "ACCRUED"
        );
        for row in &self.0 {
            let p = &row.projection;
            let _ = writeln!(
                out,
                "{:<16} {:<10} {:>4} {:>10.4} {:>10.4} {:>10.2} {:>12.2} {:>10.4}",
                p.provider,
                p.tier.to_string(),
                p.priority,
                p.hourly,
                p.daily,
                p.monthly,
                p.yearly,
                row.accrued
            );
        }
        out
    }
}

/// One provider's result in the `probe` report
#[derive(Debug, Clone, Serialize)]
pub struct ProbeRow {
    pub provider: String,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `probe` command output
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProbeReport(pub Vec<ProbeRow>);

impl ProbeReport {
    pub fn all_healthy(&self) -> bool {
        self.0.iter().all(|row| row.healthy)
    }
}

impl Render for ProbeReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        for row in &self.0 {
            let mark = if row.healthy { "✓" } else { "✗" };
            let _ = write!(out, "{} {:<16} {:>6}ms", mark, row.provider, row.latency_ms);
            if let Some(error) = &row.error {
                let _ = write!(out, "  {}", error);
            }
            let _ = writeln!(out);
        }
        out
    }
}

/// Final state after a supervised run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub phase: DeploymentPhase,
    pub active_provider: Option<String>,
    pub endpoint: Option<String>,
    pub attempt_count: u32,
}

impl From<&DeploymentState> for RunSummary {
    fn from(state: &DeploymentState) -> Self {
        Self {
            phase: state.phase,
            active_provider: state.active_provider.clone(),
            endpoint: state.endpoint.clone(),
            attempt_count: state.attempt_count,
        }
    }
}

impl Render for RunSummary {
    fn render_text(&self) -> String {
        format!(
            "Stopped in phase {} (provider: {}, attempts: {})",
            self.phase,
            or_dash(self.active_provider.as_deref()),
            self.attempt_count
        )
    }
}
