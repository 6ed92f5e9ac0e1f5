//! Registry error types

/// Errors raised while building or querying the registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Provider not found by name
    #[error("Provider not found: {0}")]
    NotFound(String),

    /// Two providers share a name
    #[error("Duplicate provider name: {0}")]
    DuplicateName(String),

    /// Two enabled providers share a priority
    #[error("Providers {first} and {second} share priority {priority}")]
    DuplicatePriority {
        priority: u32,
        first: String,
        second: String,
    },

    /// Priority or cost fields out of range
    #[error("Invalid provider {name}: {reason}")]
    InvalidProvider { name: String, reason: String },
}
