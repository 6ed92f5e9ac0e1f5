//! Deployment orchestrator
//!
//! Drives deploy and teardown calls against provider integrations. Every call
//! is bounded by a timeout. Transient failures are retried with exponential
//! backoff; authentication failures and rejections are surfaced at once as
//! fatal for the provider.

pub mod error;
pub mod orchestrator;

pub use error::OrchestratorError;
pub use orchestrator::{DeployOutcome, DeploymentOrchestrator};
