//! Utility modules for the failover controller
//!
//! - **error**: Error types, exit codes and retry with backoff
//! - **logging**: Tracing subscriber initialisation

pub mod error;
pub mod logging;

pub use error::{FailoverError, Result};
