//! Configuration loading and validation

#[cfg(test)]
mod tests {
    use failover_rs::config::ProviderKind;
    use failover_rs::core::cost::CostProjection;
    use failover_rs::{Config, ProviderRegistry, ProviderTier, Runtime};
    use std::path::PathBuf;

    fn example_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/failover.yaml.example")
    }

    #[tokio::test]
    async fn test_shipped_example_is_valid() {
        let config = Config::from_file(example_path()).await.unwrap();

        assert_eq!(config.providers.len(), 4);
        assert!(config.providers.iter().all(|p| p.kind == ProviderKind::Http));
        assert_eq!(config.deployment.name, "telegram-manager-bot");

        let registry = ProviderRegistry::from_config(&config.providers).unwrap();
        let enabled: Vec<&str> = registry
            .list_enabled()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["sui_compute", "nosana", "akash"]);
        assert_eq!(registry.get("render").unwrap().tier, ProviderTier::Backup);
    }

    #[tokio::test]
    async fn test_example_builds_runtime_and_cost_report() {
        let config = Config::from_file(example_path()).await.unwrap();
        let runtime = Runtime::new(&config).unwrap();

        let projections = CostProjection::for_registry(&runtime.registry());
        assert_eq!(projections.len(), 3);
        assert_eq!(projections[0].provider, "sui_compute");
        assert!((projections[0].daily - 0.024).abs() < 1e-9);
        assert!(projections.windows(2).all(|w| w[0].hourly <= w[1].hourly));
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let err = Config::from_yaml_str(
            r#"
providers:
  - { name: a, priority: 1, kind: local }
  - { name: b, priority: 1, kind: local }
"#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_duplicate_priority_allowed_when_disabled() {
        let config = Config::from_yaml_str(
            r#"
providers:
  - { name: a, priority: 1, kind: local }
  - { name: b, priority: 1, kind: local, enabled: false }
"#,
        )
        .unwrap();
        assert_eq!(config.providers.len(), 2);
    }

    #[test]
    fn test_policy_bounds_rejected() {
        for policy in [
            "failover: { recovery_streak: 0 }",
            "failover: { max_failover_attempts: 0 }",
            "failover: { failure_threshold: 1 }",
            "failover: { failover_timeout_secs: 0 }",
            "orchestrator: { backoff_multiplier: 0.5 }",
        ] {
            let yaml = format!(
                "providers:\n  - {{ name: a, priority: 1, kind: local }}\n{}\n",
                policy
            );
            let err = Config::from_yaml_str(&yaml).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{} should be rejected", policy);
        }
    }

    #[test]
    fn test_http_provider_requires_base_url() {
        let err = Config::from_yaml_str(
            r#"
providers:
  - { name: a, priority: 1 }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }
}
