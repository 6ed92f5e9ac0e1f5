//! Configuration and runtime fixtures

use super::providers::ToggleProvider;
use failover_rs::config::{Config, FailoverConfig, OrchestratorConfig, ProviderConfig};
use failover_rs::core::providers::ProviderSet;
use failover_rs::{ComputeProvider, Runtime};
use std::path::Path;
use std::sync::Arc;

pub const PROBE_INTERVAL_SECS: u64 = 1;
pub const FAILOVER_TIMEOUT_SECS: u64 = 10;

/// Fast policy: probes every second, failover after ten
pub fn failover_policy() -> FailoverConfig {
    FailoverConfig {
        failover_timeout_secs: FAILOVER_TIMEOUT_SECS,
        health_check_interval_secs: PROBE_INTERVAL_SECS,
        max_failover_attempts: 3,
        recovery_streak: 2,
        failure_threshold: 2,
        probe_timeout_secs: 1,
        event_queue_capacity: 64,
    }
}

/// Providers named in preference order: the first is cheapest
pub fn config(names: &[&str]) -> Config {
    let providers = names
        .iter()
        .enumerate()
        .map(|(i, name)| ProviderConfig::local(name, i as u32 + 1, 0.001 * (i as f64 + 1.0)))
        .collect();

    let mut config = Config {
        providers,
        failover: failover_policy(),
        orchestrator: OrchestratorConfig {
            call_timeout_secs: 5,
            max_retries: 1,
            base_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Config::default()
    };
    config.storage.persist = false;
    config
}

/// `config` with state persisted under `path`
pub fn persistent(mut config: Config, path: &Path) -> Config {
    config.storage.persist = true;
    config.storage.state_path = path.to_path_buf();
    config
}

pub fn provider_set(providers: &[&ToggleProvider]) -> ProviderSet {
    providers
        .iter()
        .map(|p| {
            let integration: Arc<dyn ComputeProvider> = Arc::new((*p).clone());
            (p.name().to_string(), integration)
        })
        .collect()
}

pub fn runtime(config: Config, providers: &[&ToggleProvider]) -> Runtime {
    Runtime::with_providers(config, provider_set(providers)).unwrap()
}
