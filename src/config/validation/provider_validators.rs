//! Provider configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Provider name cannot be empty".to_string());
        }

        if self.priority == 0 {
            return Err(format!(
                "Provider {} priority must be a positive integer",
                self.name
            ));
        }

        if !self.cost_per_hour.is_finite() || self.cost_per_hour < 0.0 {
            return Err(format!(
                "Provider {} cost_per_hour must be a non-negative number",
                self.name
            ));
        }

        if !self.cost_limit.is_finite() || self.cost_limit < 0.0 {
            return Err(format!(
                "Provider {} cost_limit must be a non-negative number",
                self.name
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(format!(
                "Provider {} request timeout must be greater than 0",
                self.name
            ));
        }

        if self.kind == ProviderKind::Http {
            match self.base_url.as_deref() {
                None | Some("") => {
                    return Err(format!("Provider {} requires a base_url", self.name));
                }
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    return Err(format!(
                        "Provider {} base_url must start with http:// or https://",
                        self.name
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

impl Validate for [ProviderConfig] {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating {} provider configurations", self.len());

        if self.is_empty() {
            return Err("At least one provider must be configured".to_string());
        }

        let mut names = HashSet::new();
        let mut priorities = HashSet::new();
        for provider in self {
            provider.validate()?;

            if !names.insert(provider.name.as_str()) {
                return Err(format!("Duplicate provider name: {}", provider.name));
            }

            if provider.enabled && !priorities.insert(provider.priority) {
                return Err(format!(
                    "Duplicate priority {} among enabled providers (provider {})",
                    provider.priority, provider.name
                ));
            }
        }

        Ok(())
    }
}
