//! Provider selection
//!
//! Deterministic ranking of the registry against current health and cost.
//! The authoritative order is `(cost_per_hour, priority)`; tier is carried
//! for reporting only.

pub mod error;
pub mod selector;

pub use error::SelectionError;
pub use selector::{Candidate, Eligibility, ProviderSelector};
