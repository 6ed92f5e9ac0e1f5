//! Error recovery patterns
//!
//! Bounded retries with exponential backoff for transient failures.

mod retry;
mod types;

pub use retry::{Attempted, RetryPolicy};
pub use types::RetryConfig;
