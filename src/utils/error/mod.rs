//! Error handling utilities
//!
//! This module provides the crate-wide error type and the retry mechanism used
//! for transient provider failures.

pub mod error;
pub mod recovery;

// Re-export commonly used types
pub use error::*;
pub use recovery::*;
