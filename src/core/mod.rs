//! Core failover functionality
//!
//! Registry, health probing, cost tracking, selection, orchestration and the
//! failover state machine that ties them together.

pub mod cost;
pub mod failover;
pub mod health;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod selector;
