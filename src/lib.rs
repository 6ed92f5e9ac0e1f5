//! # failover-rs
//!
//! Provider redundancy and failover for a long-running workload deployed on
//! interchangeable compute providers.
//!
//! ## Features
//!
//! - **Health probing**: independent, bounded probes per provider with
//!   debounced status transitions
//! - **Cost guard**: accrued cost per billing period against each provider's ceiling
//! - **Deterministic selection**: providers ranked by cost, then priority
//! - **Failover state machine**: Degraded timers, bounded failover attempts,
//!   recovery streaks and voluntary failback to the preferred provider
//! - **Persistence**: state and history survive restarts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use failover_rs::{Config, Runtime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/failover.yaml").await?;
//!     let runtime = Runtime::new(&config)?;
//!     let mut supervisor = runtime.supervisor();
//!     supervisor.command(failover_rs::OperatorCommand::Deploy).await?;
//!     let state = supervisor.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//!     println!("Stopped in phase {}", state.phase);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod cli;
pub mod config;
pub mod core;
pub mod runtime;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use core::failover::{
    ControlAction, ControlEvent, DeploymentPhase, DeploymentState, FailoverController,
    OperatorCommand, Supervisor, SupervisorHandle,
};
pub use core::providers::{ComputeProvider, DeployReceipt, ProviderError};
pub use core::registry::{Provider, ProviderRegistry, ProviderTier, RegistryHandle};
pub use runtime::Runtime;
pub use storage::{StateLock, StateSnapshot, StateStore};
pub use utils::error::{FailoverError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Git revision the binary was built from
pub const GIT_HASH: &str = env!("GIT_HASH");
/// Version with Git revision, for `--version`
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");
