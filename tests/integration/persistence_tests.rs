//! State survives restarts

#[cfg(test)]
mod tests {
    use crate::common::fixtures::persistent;
    use crate::common::{ToggleProvider, config, runtime};
    use crate::integration::{Running, secs};
    use failover_rs::cli::{Commands, OutputFormat};
    use failover_rs::core::failover::TransitionReason;
    use failover_rs::{Config, DeploymentPhase, OperatorCommand, Runtime, StateStore};
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// One HTTP provider with state persisted under `state_path`
    fn http_config(server: &MockServer, state_path: &Path) -> Config {
        let yaml = format!(
            r#"
providers:
  - name: primary
    tier: primary
    priority: 1
    cost_per_hour: 0.001
    base_url: "{}"
    request_timeout_secs: 2
failover:
  health_check_interval_secs: 1
  probe_timeout_secs: 1
orchestrator:
  call_timeout_secs: 5
  max_retries: 1
  base_delay_ms: 10
  max_delay_ms: 50
  jitter: false
storage:
  persist: true
  state_path: "{}"
"#,
            server.uri(),
            state_path.display()
        );
        Config::from_yaml_str(&yaml).unwrap()
    }

    async fn mount_provider(server: &MockServer, id: &str) {
        Mock::given(method("POST"))
            .and(path("/deployments"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": id,
                "endpoint": format!("https://{}.example", id),
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/deployments/{}", id)))
            .respond_with(ResponseTemplate::new(204))
            .mount(server)
            .await;
    }

    async fn deletes_of(server: &MockServer, id: &str) -> usize {
        let target = format!("/deployments/{}", id);
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "DELETE" && r.url.path() == target)
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_active_deployment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let cfg = persistent(config(&["a", "b"]), &path);

        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(cfg.clone(), &[&a, &b])).await;
        running
            .until(secs(30), |s| s.phase == DeploymentPhase::Active)
            .await;
        let stopped = running.shutdown().await.unwrap();
        assert_eq!(stopped.active_provider.as_deref(), Some("a"));

        let snapshot = StateStore::new(&path).load().await.unwrap().unwrap();
        assert_eq!(snapshot.deployment.phase, DeploymentPhase::Active);
        assert_eq!(snapshot.deployment.history.len(), 1);
        assert!(snapshot.health.contains_key("a"));

        // Restart with fresh integrations: nothing is redeployed
        let a2 = ToggleProvider::new("a");
        let b2 = ToggleProvider::new("b");
        let restarted = runtime(cfg, &[&a2, &b2]);
        let mut supervisor = restarted.supervisor();
        supervisor.restore(restarted.load_snapshot().await.unwrap()).await;
        assert_eq!(supervisor.controller().phase(), DeploymentPhase::Active);

        let running = Running::spawn(supervisor);
        tokio::time::sleep(secs(3)).await;
        assert_eq!(a2.deploys(), 0);

        // And monitoring continues
        a2.set_healthy(false);
        let state = running
            .until(secs(120), |s| s.active_provider.as_deref() == Some("b"))
            .await;
        assert_eq!(state.history.len(), 2);
        assert_eq!(b2.deploys(), 1);

        running.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_requires_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let cfg = persistent(config(&["a"]), &path);

        let a = ToggleProvider::new("a");
        a.reject_deploys(true);
        let running = Running::deploy(&runtime(cfg.clone(), &[&a])).await;
        assert!(running.task.await.unwrap().is_err());

        let restarted = runtime(cfg, &[&a]);
        let snapshot = restarted.load_snapshot().await.unwrap();
        assert_eq!(snapshot.deployment.phase, DeploymentPhase::Failed);
        assert!(snapshot.deployment.failure.is_some());

        let mut supervisor = restarted.supervisor();
        supervisor.restore(snapshot).await;
        let err = supervisor.command(OperatorCommand::Deploy).await.unwrap_err();
        assert_eq!(err.exit_code(), 5);

        a.reject_deploys(false);
        supervisor.command(OperatorCommand::Reset).await.unwrap();
        let running = Running::spawn(supervisor);
        let state = running
            .until(secs(30), |s| s.phase == DeploymentPhase::Active)
            .await;

        let reasons: Vec<TransitionReason> = state.history.iter().map(|h| h.reason).collect();
        assert_eq!(
            reasons,
            vec![
                TransitionReason::NoViableProvider,
                TransitionReason::OperatorReset,
                TransitionReason::InitialDeploy,
            ]
        );
        assert_eq!(state.attempt_count, 0);

        running.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_persists_idle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let cfg = persistent(config(&["a"]), &path);

        let a = ToggleProvider::new("a");
        let running = Running::deploy(&runtime(cfg.clone(), &[&a])).await;
        running
            .until(secs(30), |s| s.phase == DeploymentPhase::Active)
            .await;
        running.shutdown().await.unwrap();

        let restarted = runtime(cfg, &[&a]);
        let mut supervisor = restarted.supervisor();
        supervisor.restore(restarted.load_snapshot().await.unwrap()).await;
        supervisor.command(OperatorCommand::Teardown).await.unwrap();
        supervisor.drain().await;
        assert_eq!(a.teardowns(), 1);

        let snapshot = restarted.load_snapshot().await.unwrap();
        assert_eq!(snapshot.deployment.phase, DeploymentPhase::Idle);
        assert_eq!(snapshot.deployment.active_provider, None);
        assert_eq!(
            snapshot.deployment.history.last().unwrap().reason,
            TransitionReason::OperatorTeardown
        );
    }

    #[tokio::test]
    async fn test_teardown_after_restart_deletes_recorded_deployment() {
        let server = MockServer::start().await;
        mount_provider(&server, "dep-1").await;
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        let cfg = http_config(&server, &state_path);

        let first = Runtime::new(&cfg).unwrap();
        let running = Running::deploy(&first).await;
        running
            .until(secs(10), |s| s.active_provider.as_deref() == Some("primary"))
            .await;
        running.shutdown().await.unwrap();

        let snapshot = StateStore::new(&state_path).load().await.unwrap().unwrap();
        assert_eq!(
            snapshot.deployment.deployments.get("primary").map(String::as_str),
            Some("dep-1")
        );

        // A new process knows the deployment only from the state file
        let restarted = Runtime::new(&cfg).unwrap();
        failover_rs::cli::commands::execute(
            Commands::Teardown,
            &restarted,
            state_path.clone(),
            OutputFormat::Text,
        )
        .await
        .unwrap();

        assert_eq!(deletes_of(&server, "dep-1").await, 1);
        let snapshot = restarted.load_snapshot().await.unwrap();
        assert_eq!(snapshot.deployment.phase, DeploymentPhase::Idle);
        assert!(snapshot.deployment.deployments.is_empty());
    }

    #[tokio::test]
    async fn test_teardown_refused_while_deployment_is_supervised() {
        let server = MockServer::start().await;
        mount_provider(&server, "dep-2").await;
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        let cfg = http_config(&server, &state_path);

        // Hold the state file the way `deploy` does while supervising
        let supervising = Runtime::new(&cfg).unwrap();
        let lock = supervising.lock_state().unwrap();
        let running = Running::deploy(&supervising).await;
        running
            .until(secs(10), |s| s.phase == DeploymentPhase::Active)
            .await;

        let other = Runtime::new(&cfg).unwrap();
        let err = failover_rs::cli::commands::execute(
            Commands::Teardown,
            &other,
            state_path.clone(),
            OutputFormat::Text,
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert_eq!(deletes_of(&server, "dep-2").await, 0);

        let state = running.handle.state();
        assert_eq!(state.phase, DeploymentPhase::Active);
        assert_eq!(state.active_provider.as_deref(), Some("primary"));

        running.shutdown().await.unwrap();
        drop(lock);

        // Once the supervisor is gone the same command goes through
        failover_rs::cli::commands::execute(
            Commands::Teardown,
            &other,
            state_path,
            OutputFormat::Text,
        )
        .await
        .unwrap();
        assert_eq!(deletes_of(&server, "dep-2").await, 1);
        let snapshot = other.load_snapshot().await.unwrap();
        assert_eq!(snapshot.deployment.phase, DeploymentPhase::Idle);
    }
}
