//! REST compute provider
//!
//! Speaks a small deployment API:
//!
//! - `GET {base}/health` liveness
//! - `POST {base}/deployments` create, body is the deployment descriptor,
//!   response `{"id": ..., "endpoint": ...}`
//! - `DELETE {base}/deployments/{id}` remove

use super::{ComputeProvider, DeployReceipt, ProviderError};
use crate::config::{DeploymentDescriptor, ProviderConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct DeploymentResponse {
    id: String,
    #[serde(default)]
    endpoint: Option<String>,
}

/// HTTP provider integration
#[derive(Debug)]
pub struct HttpProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: Client,
    deployment_id: Mutex<Option<String>>,
}

impl HttpProvider {
    /// Create a provider against `base_url`
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let name = name.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::configuration(&name, e.to_string()))?;

        Ok(Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
            client,
            deployment_id: Mutex::new(None),
        })
    }

    /// Create a provider from configuration, reading the credential from the
    /// configured environment variable
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            ProviderError::configuration(&config.name, "base_url is required for http providers")
        })?;

        let api_key = match &config.credentials_env {
            Some(var) => {
                let key = std::env::var(var).ok().filter(|v| !v.is_empty());
                if key.is_none() {
                    warn!(
                        "Credential variable {} for provider {} is not set",
                        var, config.name
                    );
                }
                key
            }
            None => None,
        };

        Self::new(
            &config.name,
            base_url,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Identifier of the deployment this provider currently holds
    pub fn deployment_id(&self) -> Option<String> {
        self.deployment_id.lock().clone()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::timeout(&self.name, self.timeout)
        } else {
            ProviderError::network(&self.name, err.to_string())
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(&self.name, status.as_u16(), body.trim()))
    }
}

#[async_trait]
impl ComputeProvider for HttpProvider {
    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<DeployReceipt, ProviderError> {
        if self.api_key.is_none() {
            debug!("Deploying to {} without credentials", self.name);
        }

        let url = format!("{}/deployments", self.base_url);
        let response = self
            .authorize(self.client.post(&url))
            .json(descriptor)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = self.check_status(response).await?;

        let body: DeploymentResponse = response.json().await.map_err(|e| {
            ProviderError::rejected(&self.name, format!("Malformed deployment response: {}", e))
        })?;

        *self.deployment_id.lock() = Some(body.id.clone());
        debug!("Provider {} created deployment {}", self.name, body.id);

        Ok(DeployReceipt {
            deployment_id: Some(body.id),
            endpoint: body.endpoint,
        })
    }

    async fn teardown(&self, deployment_id: Option<String>) -> Result<(), ProviderError> {
        let Some(id) = deployment_id.or_else(|| self.deployment_id()) else {
            debug!("Provider {} has no deployment to tear down", self.name);
            return Ok(());
        };

        let url = format!("{}/deployments/{}", self.base_url, id);
        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() != StatusCode::NOT_FOUND {
            self.check_status(response).await?;
        }

        let mut current = self.deployment_id.lock();
        if current.as_deref() == Some(id.as_str()) {
            *current = None;
        }
        Ok(())
    }
}
