//! Persistence of controller state
//!
//! The deployment state, health records and cost ledger are written after
//! every transition so a restarted process resumes where it stopped instead
//! of provisioning blindly.

pub mod state;

pub use state::{StateLock, StateSnapshot, StateStore};
