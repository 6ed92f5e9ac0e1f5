//! Control loop scenarios on a paused clock

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{FAILOVER_TIMEOUT_SECS, provider_set};
    use crate::common::{ToggleProvider, config, runtime};
    use crate::integration::{Running, secs};
    use failover_rs::core::failover::TransitionReason;
    use failover_rs::{DeploymentPhase, OperatorCommand, ProviderRegistry};
    use tokio::time::Instant;

    fn active(state: &failover_rs::DeploymentState, name: &str) -> bool {
        state.phase == DeploymentPhase::Active && state.active_provider.as_deref() == Some(name)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_deploy_picks_cheapest() {
        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(config(&["a", "b"]), &[&a, &b])).await;

        let state = running.until(secs(5), |s| active(s, "a")).await;
        assert_eq!(state.attempt_count, 0);
        assert_eq!(state.endpoint.as_deref(), Some("https://workload.a.example"));
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].reason, TransitionReason::InitialDeploy);
        assert_eq!(a.deploys(), 1);
        assert_eq!(b.deploys(), 0);

        let state = running.shutdown().await.unwrap();
        assert_eq!(state.phase, DeploymentPhase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failover_waits_for_timeout() {
        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(config(&["a", "b"]), &[&a, &b])).await;
        running.until(secs(5), |s| active(s, "a")).await;

        a.set_healthy(false);
        let broken_at = Instant::now();

        running
            .until(secs(5), |s| s.phase == DeploymentPhase::Degraded)
            .await;
        assert_eq!(b.deploys(), 0);

        let state = running.until(secs(60), |s| active(s, "b")).await;
        assert!(broken_at.elapsed() >= secs(FAILOVER_TIMEOUT_SECS));

        let last = state.history.last().unwrap();
        assert_eq!(last.from.as_deref(), Some("a"));
        assert_eq!(last.to.as_deref(), Some("b"));
        assert_eq!(last.reason, TransitionReason::Unhealthy);
        assert_eq!(state.attempt_count, 0);
        assert!(state.episode.is_none());
        assert!(a.teardowns() >= 1);

        running.handle.teardown().await.unwrap();
        let state = running.task.await.unwrap().unwrap();
        assert_eq!(state.phase, DeploymentPhase::Idle);
        assert_eq!(
            state.history.last().unwrap().reason,
            TransitionReason::OperatorTeardown
        );
        assert_eq!(b.teardowns(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_before_timeout_keeps_provider() {
        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(config(&["a", "b"]), &[&a, &b])).await;
        running.until(secs(5), |s| active(s, "a")).await;

        a.set_healthy(false);
        running
            .until(secs(5), |s| s.phase == DeploymentPhase::Degraded)
            .await;
        a.set_healthy(true);

        running.until(secs(5), |s| active(s, "a")).await;
        tokio::time::sleep(secs(FAILOVER_TIMEOUT_SECS * 2)).await;

        let state = running.handle.state();
        assert!(active(&state, "a"));
        assert_eq!(state.history.len(), 1);
        assert_eq!(b.deploys(), 0);
        assert_eq!(a.teardowns(), 0);

        running.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failback_to_preferred_provider() {
        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(config(&["a", "b"]), &[&a, &b])).await;
        running.until(secs(5), |s| active(s, "a")).await;

        a.set_healthy(false);
        running.until(secs(60), |s| active(s, "b")).await;

        a.set_healthy(true);
        let state = running.until(secs(60), |s| active(s, "a")).await;

        let reasons: Vec<TransitionReason> = state.history.iter().map(|h| h.reason).collect();
        assert_eq!(
            reasons,
            vec![
                TransitionReason::InitialDeploy,
                TransitionReason::Unhealthy,
                TransitionReason::VoluntaryFailback,
            ]
        );
        assert_eq!(a.deploys(), 2);
        assert_eq!(b.deploys(), 1);
        assert_eq!(state.attempt_count, 0);

        tokio::time::sleep(secs(1)).await;
        assert_eq!(b.teardowns(), 1);

        running.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cost_limit_failover_and_billing_reset() {
        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(config(&["a", "b"]), &[&a, &b])).await;
        running.until(secs(5), |s| active(s, "a")).await;

        running.handle.report_cost("a", 1_000.0).await.unwrap();
        let state = running
            .until(secs(5), |s| s.phase == DeploymentPhase::Degraded)
            .await;
        assert!(state.degraded_since.is_some());

        let state = running.until(secs(60), |s| active(s, "b")).await;
        assert_eq!(
            state.history.last().unwrap().reason,
            TransitionReason::CostLimitExceeded
        );

        // Still over its limit, so no failback yet
        tokio::time::sleep(secs(10)).await;
        assert!(active(&running.handle.state(), "b"));

        running.handle.reset_billing_period().await.unwrap();
        let state = running.until(secs(30), |s| active(s, "a")).await;
        assert_eq!(
            state.history.last().unwrap().reason,
            TransitionReason::VoluntaryFailback
        );

        running.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_viable_provider_fails_run() {
        let a = ToggleProvider::new("a");
        a.reject_deploys(true);

        let running = Running::deploy(&runtime(config(&["a"]), &[&a])).await;
        let err = running.task.await.unwrap().unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(a.deploys(), 1);
        assert_eq!(running.handle.state().phase, DeploymentPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let names = ["a", "b", "c", "d", "e"];
        let providers: Vec<ToggleProvider> = names.iter().map(|n| ToggleProvider::new(n)).collect();
        for provider in &providers {
            provider.reject_deploys(true);
        }
        let refs: Vec<&ToggleProvider> = providers.iter().collect();

        let running = Running::deploy(&runtime(config(&names), &refs)).await;
        let err = running.task.await.unwrap().unwrap_err();
        assert_eq!(err.exit_code(), 4);

        let state = running.handle.state();
        assert_eq!(state.phase, DeploymentPhase::Failed);
        assert_eq!(state.attempt_count, 3);
        assert_eq!(
            state.history.last().unwrap().reason,
            TransitionReason::AttemptsExhausted
        );

        // The provisioning attempt plus three counted switches
        let tried: u32 = providers.iter().map(|p| p.deploys()).sum();
        assert_eq!(tried, 4);
        assert_eq!(providers[4].deploys(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_only_from_failed() {
        let a = ToggleProvider::new("a");
        let runtime = runtime(config(&["a"]), &[&a]);
        let mut supervisor = runtime.supervisor();

        let err = supervisor.command(OperatorCommand::Reset).await.unwrap_err();
        assert_eq!(err.exit_code(), 5);

        supervisor.command(OperatorCommand::Deploy).await.unwrap();
        let err = supervisor.command(OperatorCommand::Deploy).await.unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_is_idempotent() {
        let a = ToggleProvider::new("a");
        let runtime = runtime(config(&["a"]), &[&a]);
        let running = Running::deploy(&runtime).await;
        running.until(secs(5), |s| active(s, "a")).await;

        running.handle.teardown().await.unwrap();
        running.task.await.unwrap().unwrap();
        assert_eq!(a.teardowns(), 1);

        let mut supervisor = runtime.supervisor();
        supervisor.command(OperatorCommand::Teardown).await.unwrap();
        supervisor.drain().await;
        assert_eq!(a.teardowns(), 1);
        assert_eq!(supervisor.controller().phase(), DeploymentPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probes_run_for_every_enabled_provider() {
        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(config(&["a", "b"]), &[&a, &b])).await;

        tokio::time::sleep(secs(5)).await;
        assert!(a.health_checks() >= 4);
        assert!(b.health_checks() >= 4);

        running.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cost_accrual_survives_reload() {
        let mut cfg = config(&["a", "b"]);
        // a accrues 1.0 per second against a limit of 5.0
        cfg.providers[0].cost_per_hour = 3_600.0;
        cfg.providers[0].cost_limit = 5.0;
        cfg.providers[1].cost_per_hour = 7_200.0;
        cfg.providers[1].cost_limit = 1_000_000.0;

        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(cfg.clone(), &[&a, &b])).await;
        running.until(secs(5), |s| active(s, "a")).await;

        running
            .handle
            .reload(
                ProviderRegistry::from_config(&cfg.providers).unwrap(),
                provider_set(&[&a, &b]),
            )
            .await
            .unwrap();

        let state = running.until(secs(60), |s| active(s, "b")).await;
        assert_eq!(
            state.history.last().unwrap().reason,
            TransitionReason::CostLimitExceeded
        );

        running.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_disabling_active_provider_fails_over() {
        let mut cfg = config(&["a", "b"]);
        let a = ToggleProvider::new("a");
        let b = ToggleProvider::new("b");
        let running = Running::deploy(&runtime(cfg.clone(), &[&a, &b])).await;
        running.until(secs(5), |s| active(s, "a")).await;

        cfg.providers[0].enabled = false;
        running
            .handle
            .reload(
                ProviderRegistry::from_config(&cfg.providers).unwrap(),
                provider_set(&[&a, &b]),
            )
            .await
            .unwrap();

        let state = running.until(secs(60), |s| active(s, "b")).await;
        assert_eq!(
            state.history.last().unwrap().reason,
            TransitionReason::ProviderDisabled
        );
        assert_eq!(a.teardowns(), 1);

        // Probing continues for the providers that are still enabled
        let checks = b.health_checks();
        tokio::time::sleep(secs(5)).await;
        assert!(b.health_checks() >= checks + 4);

        running.shutdown().await.unwrap();
    }
}
