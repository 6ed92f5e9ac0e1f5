//! Cost tracking
//!
//! [`CostGuard`] is a pure check of accrued cost against a provider's ceiling.
//! [`CostLedger`] holds accrued cost per provider for the current billing
//! period and is owned by the failover controller.

pub mod guard;
pub mod ledger;
pub mod report;

pub use guard::{CostGuard, CostVerdict};
pub use ledger::CostLedger;
pub use report::CostProjection;
