//! Command implementations

use super::output::{
    CostReport, CostRow, HistoryReport, OutputFormat, ProbeReport, ProbeRow, ProviderStatus,
    RunSummary, StatusReport, print_output, print_success,
};
use crate::config::Config;
use crate::core::cost::CostProjection;
use crate::core::failover::{DeploymentPhase, OperatorCommand, Supervisor, SupervisorHandle};
use crate::core::health::HealthProber;
use crate::core::providers::ProviderError;
use crate::runtime::Runtime;
use crate::utils::error::Result;
use clap::Subcommand;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Available commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Deploy the workload (or resume a persisted deployment) and supervise it
    Deploy,

    /// Show the deployment phase and every provider's health and eligibility
    Status,

    /// Show the failover history
    History {
        /// Only the most recent entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Tear the deployment down
    Teardown,

    /// Leave the Failed phase and redeploy
    Reset,

    /// Show projected running costs of the enabled providers
    Costs,

    /// Probe every enabled provider once
    Probe,

    /// Print the effective configuration
    Config,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Deploy => "deploy",
            Commands::Status => "status",
            Commands::History { .. } => "history",
            Commands::Teardown => "teardown",
            Commands::Reset => "reset",
            Commands::Costs => "costs",
            Commands::Probe => "probe",
            Commands::Config => "config",
        }
    }
}

/// Execute a command
pub async fn execute(
    command: Commands,
    runtime: &Runtime,
    config_path: PathBuf,
    output: OutputFormat,
) -> Result<()> {
    match command {
        Commands::Deploy => deploy(runtime, config_path, output).await,
        Commands::Status => status(runtime, output).await,
        Commands::History { limit } => history(runtime, limit, output).await,
        Commands::Teardown => teardown(runtime).await,
        Commands::Reset => reset(runtime, config_path, output).await,
        Commands::Costs => costs(runtime, output).await,
        Commands::Probe => probe(runtime, output).await,
        Commands::Config => {
            println!("{}", runtime.config().to_yaml()?);
            Ok(())
        }
    }
}

async fn restored(runtime: &Runtime) -> Result<Supervisor> {
    let mut supervisor = runtime.supervisor();
    let snapshot = runtime.load_snapshot().await?;
    supervisor.restore(snapshot).await;
    Ok(supervisor)
}

async fn deploy(runtime: &Runtime, config_path: PathBuf, output: OutputFormat) -> Result<()> {
    let _lock = runtime.lock_state()?;
    let mut supervisor = restored(runtime).await?;
    match supervisor.controller().phase() {
        DeploymentPhase::Idle | DeploymentPhase::Failed => {
            supervisor.command(OperatorCommand::Deploy).await?
        }
        phase => info!("Resuming persisted deployment in phase {}", phase),
    }
    supervise(runtime, supervisor, config_path, output).await
}

async fn reset(runtime: &Runtime, config_path: PathBuf, output: OutputFormat) -> Result<()> {
    let _lock = runtime.lock_state()?;
    let mut supervisor = restored(runtime).await?;
    supervisor.command(OperatorCommand::Reset).await?;
    supervise(runtime, supervisor, config_path, output).await
}

async fn teardown(runtime: &Runtime) -> Result<()> {
    // Refused while a deploy or reset is supervising the same state file
    let _lock = runtime.lock_state()?;
    let mut supervisor = restored(runtime).await?;
    if supervisor.controller().phase() == DeploymentPhase::Idle {
        print_success("Nothing deployed");
        return Ok(());
    }
    supervisor.command(OperatorCommand::Teardown).await?;
    supervisor.drain().await;
    print_success("Deployment torn down");
    Ok(())
}

async fn supervise(
    runtime: &Runtime,
    supervisor: Supervisor,
    config_path: PathBuf,
    output: OutputFormat,
) -> Result<()> {
    let reloader = spawn_reloader(runtime.clone(), supervisor.handle(), config_path);
    let result = supervisor.run(shutdown_signal()).await;
    if let Some(reloader) = reloader {
        reloader.abort();
    }
    let state = result?;
    print_output(&RunSummary::from(&state), output)
}

async fn status(runtime: &Runtime, output: OutputFormat) -> Result<()> {
    let snapshot = runtime.load_snapshot().await?;
    runtime.health().restore(snapshot.health);

    let exclude = snapshot
        .deployment
        .episode
        .as_ref()
        .map(|episode| episode.excluded.clone())
        .unwrap_or_default();
    let providers = runtime
        .selector()
        .rank(&exclude, &snapshot.costs)
        .into_iter()
        .map(|candidate| {
            let health = runtime.health().get(&candidate.provider.name);
            ProviderStatus::new(candidate, health)
        })
        .collect();

    print_output(&StatusReport::new(&snapshot.deployment, providers), output)
}

async fn history(runtime: &Runtime, limit: Option<usize>, output: OutputFormat) -> Result<()> {
    let mut entries = runtime.load_snapshot().await?.deployment.history;
    if let Some(limit) = limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }
    print_output(&HistoryReport(entries), output)
}

async fn costs(runtime: &Runtime, output: OutputFormat) -> Result<()> {
    let ledger = runtime.load_snapshot().await?.costs;
    let rows = CostProjection::for_registry(&runtime.registry())
        .into_iter()
        .map(|projection| CostRow {
            accrued: ledger.accrued(&projection.provider),
            projection,
        })
        .collect();
    print_output(&CostReport(rows), output)
}

async fn probe(runtime: &Runtime, output: OutputFormat) -> Result<()> {
    let registry = runtime.registry();
    let timeout = runtime.config().failover.probe_timeout();

    let probes = registry.list_enabled().into_iter().map(|provider| {
        let name = provider.name.clone();
        let integration = runtime.orchestrator().integration(&name);
        async move {
            match integration {
                Some(integration) => {
                    let result = HealthProber::probe(integration.as_ref(), timeout).await;
                    ProbeRow {
                        provider: name,
                        healthy: result.healthy,
                        latency_ms: result.latency.as_millis() as u64,
                        error: result.error.map(|e| e.to_string()),
                    }
                }
                None => ProbeRow {
                    provider: name,
                    healthy: false,
                    latency_ms: 0,
                    error: Some("no integration configured".to_string()),
                },
            }
        }
    });

    let report = ProbeReport(futures::future::join_all(probes).await);
    print_output(&report, output)?;

    if report.all_healthy() {
        Ok(())
    } else {
        let unhealthy: Vec<&str> = report
            .0
            .iter()
            .filter(|row| !row.healthy)
            .map(|row| row.provider.as_str())
            .collect();
        Err(ProviderError::unavailable(unhealthy.join(", "), "probe failed").into())
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Reload the provider list from `config_path` on every SIGHUP
///
/// Only the `providers` section is re-read; policy changes need a restart.
#[cfg(unix)]
fn spawn_reloader(
    runtime: Runtime,
    handle: SupervisorHandle,
    config_path: PathBuf,
) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!("Failed to install SIGHUP handler, reload disabled: {}", e);
            return None;
        }
    };

    Some(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("Received SIGHUP, reloading providers from {}", config_path.display());
            let config = match Config::from_file(&config_path).await {
                Ok(config) => config,
                Err(e) => {
                    error!("Reload rejected: {}", e);
                    continue;
                }
            };
            let reloaded = match runtime.reload_providers(&config) {
                Ok(reloaded) => reloaded,
                Err(e) => {
                    error!("Reload rejected: {}", e);
                    continue;
                }
            };
            if let Err(e) = handle.reload(reloaded.0, reloaded.1).await {
                warn!("Reload not applied: {}", e);
                return;
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_reloader(
    _runtime: Runtime,
    _handle: SupervisorHandle,
    _config_path: PathBuf,
) -> Option<JoinHandle<()>> {
    None
}
