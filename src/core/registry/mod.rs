//! Provider registry
//!
//! Static configuration of each candidate provider. The registry is immutable
//! for the duration of a run; a reload replaces the whole registry at once so
//! readers never observe a partially edited configuration.

pub mod error;
pub mod registry;
pub mod types;

pub use error::RegistryError;
pub use registry::{ProviderRegistry, RegistryHandle};
pub use types::{Provider, ProviderTier};
