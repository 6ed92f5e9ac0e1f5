//! Configuration data models
//!
//! This module defines all configuration structures used by the failover controller.

pub mod deployment;
pub mod failover;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod storage;

// Re-export all configuration types
pub use deployment::*;
pub use failover::*;
pub use logging::*;
pub use orchestrator::*;
pub use provider::*;
pub use storage::*;

/// Default value for boolean flags that are on unless disabled
pub fn default_true() -> bool {
    true
}

/// Default request timeout in seconds
pub fn default_timeout() -> u64 {
    30
}
