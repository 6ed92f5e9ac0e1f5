//! Common test utilities for failover-rs
//!
//! # Usage
//!
//! ```rust
//! use crate::common::{fixtures, providers::ToggleProvider};
//!
//! #[tokio::test(start_paused = true)]
//! async fn my_test() {
//!     let a = ToggleProvider::new("a");
//!     let runtime = fixtures::runtime(fixtures::config(&["a"]), &[&a]);
//!     // ...
//! }
//! ```

pub mod fixtures;
pub mod providers;

pub use fixtures::{config, runtime};
pub use providers::ToggleProvider;
