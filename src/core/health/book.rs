//! Shared health records

use super::types::{HealthRecord, HealthStatus};
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Health records of every provider
///
/// Entries are written only by the provider's own probe loop; everybody else
/// reads.
#[derive(Debug, Default)]
pub struct HealthBook {
    records: DashMap<String, HealthRecord>,
}

impl HealthBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record of a provider, default when never probed
    pub fn get(&self, provider: &str) -> HealthRecord {
        self.records
            .get(provider)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn status(&self, provider: &str) -> HealthStatus {
        self.records
            .get(provider)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    /// Mutate a provider's record in place, returning the updated copy
    pub fn update<F>(&self, provider: &str, f: F) -> HealthRecord
    where
        F: FnOnce(&mut HealthRecord),
    {
        let mut entry = self.records.entry(provider.to_string()).or_default();
        f(entry.value_mut());
        entry.value().clone()
    }

    /// Ordered copy of every record
    pub fn snapshot(&self) -> BTreeMap<String, HealthRecord> {
        self.records
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Seed records from a persisted snapshot
    pub fn restore(&self, records: BTreeMap<String, HealthRecord>) {
        for (provider, record) in records {
            self.records.insert(provider, record);
        }
    }

    /// Forget providers no longer configured
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.records.retain(|name, _| keep(name));
    }
}
