//! Orchestrator error types

use crate::core::providers::ProviderError;
use std::time::Duration;

/// Deploy/teardown failures after local recovery
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrchestratorError {
    /// The provider refused the workload
    #[error("Provider {provider} rejected the deployment: {message}")]
    ProviderRejected { provider: String, message: String },

    /// Credentials missing or refused
    #[error("Authentication failed for provider {provider}: {message}")]
    AuthFailure { provider: String, message: String },

    /// Every attempt timed out
    #[error("Provider {provider} did not respond within {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    /// Transient failures outlasted the retry budget
    #[error("Provider {provider} failed after {attempts} attempts: {message}")]
    Transient {
        provider: String,
        attempts: u32,
        message: String,
    },

    /// No integration is configured under this name
    #[error("No integration for provider {0}")]
    UnknownProvider(String),
}

impl OrchestratorError {
    /// Fatal for the provider for the rest of the failure episode
    pub fn is_provider_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProviderRejected { .. } | Self::AuthFailure { .. } | Self::UnknownProvider(_)
        )
    }

    /// Classify a provider error that survived the retry policy
    pub fn from_provider(provider: &str, err: ProviderError, attempts: u32, timeout: Duration) -> Self {
        match err {
            ProviderError::Authentication { message, .. } => Self::AuthFailure {
                provider: provider.to_string(),
                message,
            },
            ProviderError::Rejected { message, .. } | ProviderError::Configuration { message, .. } => {
                Self::ProviderRejected {
                    provider: provider.to_string(),
                    message,
                }
            }
            ProviderError::Timeout { .. } => Self::Timeout {
                provider: provider.to_string(),
                timeout,
            },
            ProviderError::Network { message, .. } | ProviderError::Unavailable { message, .. } => {
                Self::Transient {
                    provider: provider.to_string(),
                    attempts,
                    message,
                }
            }
        }
    }
}
