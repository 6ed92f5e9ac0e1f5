//! Provider error types

use std::time::Duration;

/// Errors returned by a provider integration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Credentials missing or rejected
    #[error("Authentication failed for {provider}: {message}")]
    Authentication { provider: String, message: String },

    /// The provider refused the request itself (bad descriptor, conflict)
    #[error("Request rejected by {provider}: {message}")]
    Rejected { provider: String, message: String },

    /// Transport-level failure
    #[error("Network error talking to {provider}: {message}")]
    Network { provider: String, message: String },

    /// Request did not complete in time
    #[error("Request to {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    /// Provider temporarily unable to serve (throttled, 5xx)
    #[error("Provider {provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    /// Integration misconfigured locally
    #[error("Provider {provider} misconfigured: {message}")]
    Configuration { provider: String, message: String },
}

impl ProviderError {
    pub fn authentication(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rejected(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout,
        }
    }

    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Transient failures worth retrying against the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Unavailable { .. }
        )
    }

    /// Map an HTTP status to an error
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };
        match status {
            401 | 403 => Self::authentication(provider, message),
            400 | 404 | 409 | 422 => Self::rejected(provider, message),
            408 | 504 => Self::Timeout {
                provider: provider.to_string(),
                timeout: Duration::ZERO,
            },
            429 | 500..=599 => Self::unavailable(provider, message),
            _ => Self::rejected(provider, message),
        }
    }
}
