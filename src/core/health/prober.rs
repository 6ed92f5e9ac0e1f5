//! Probe execution

use super::book::HealthBook;
use super::types::{ProbeError, ProbeReport, ProbeResult};
use crate::core::providers::ComputeProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Runs probes and folds their results into the [`HealthBook`]
#[derive(Debug, Clone)]
pub struct HealthProber {
    book: Arc<HealthBook>,
    failure_threshold: u32,
    recovery_streak: u32,
}

impl HealthProber {
    pub fn new(book: Arc<HealthBook>, failure_threshold: u32, recovery_streak: u32) -> Self {
        Self {
            book,
            failure_threshold,
            recovery_streak,
        }
    }

    pub fn book(&self) -> &Arc<HealthBook> {
        &self.book
    }

    /// Perform one probe; never takes longer than `timeout`
    pub async fn probe(provider: &dyn ComputeProvider, timeout: Duration) -> ProbeResult {
        let start = Instant::now();
        match tokio::time::timeout(timeout, provider.health_check()).await {
            Ok(Ok(())) => ProbeResult::success(start.elapsed()),
            Ok(Err(e)) => ProbeResult::failure(start.elapsed(), ProbeError::Provider(e)),
            Err(_) => ProbeResult::failure(start.elapsed(), ProbeError::Timeout(timeout)),
        }
    }

    /// Fold a probe result into the provider's record
    pub fn record(&self, provider: &str, result: ProbeResult) -> ProbeReport {
        let before = self.book.status(provider);
        let record = self.book.update(provider, |r| {
            r.apply(&result, self.failure_threshold, self.recovery_streak)
        });

        if record.status != before {
            warn!(
                "Provider {} health changed: {} -> {}",
                provider, before, record.status
            );
        } else {
            debug!(
                "Provider {} probe healthy={} ({}ms)",
                provider,
                result.healthy,
                result.latency.as_millis()
            );
        }

        ProbeReport {
            provider: provider.to_string(),
            result,
            record,
        }
    }

    /// Probe and record in one step
    pub async fn check(
        &self,
        name: &str,
        provider: &dyn ComputeProvider,
        timeout: Duration,
    ) -> ProbeReport {
        let result = Self::probe(provider, timeout).await;
        self.record(name, result)
    }
}
