//! Configuration validation
//!
//! Each configuration section implements [`Validate`]; `Config::validate`
//! runs them all and wraps failures into `FailoverError::Config`.

mod failover_validators;
mod provider_validators;
mod trait_def;

pub use trait_def::Validate;
