//! Error handling for the failover controller
//!
//! This module defines the top-level error type and its conversions.

mod conversions;
mod types;

pub use types::{FailoverError, Result};
