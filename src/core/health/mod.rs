//! Health probing
//!
//! Periodic liveness checks with debounced status transitions. Each provider
//! has exactly one probe loop, and that loop is the only writer of the
//! provider's [`HealthRecord`].

pub mod book;
pub mod prober;
pub mod types;

pub use book::HealthBook;
pub use prober::HealthProber;
pub use types::{HealthRecord, HealthStatus, ProbeError, ProbeReport, ProbeResult};
