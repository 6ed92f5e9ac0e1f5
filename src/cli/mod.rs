//! Command-line interface
//!
//! The `failover` binary supervises one deployment (`deploy`, `reset`),
//! performs operator actions against the persisted state (`teardown`) and
//! reports on it (`status`, `history`, `costs`, `probe`).

pub mod commands;
pub mod output;

pub use commands::Commands;
pub use output::OutputFormat;

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::runtime::Runtime;
use crate::utils::error::Result;
use crate::utils::logging::init_tracing;
use clap::Parser;
use std::path::PathBuf;

/// Provider redundancy and failover controller
#[derive(Debug, Parser)]
#[command(name = "failover")]
#[command(about = "Provider redundancy and failover controller", long_about = None)]
#[command(version, long_version = crate::LONG_VERSION)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FAILOVER_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// State file path (overrides `storage.state_path`)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Output format (text, json, yaml)
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Load the configuration this invocation points at
    pub async fn load_config(&self) -> Result<Config> {
        let mut config = Config::from_file(&self.config).await?;
        if let Some(state) = &self.state {
            config.storage.state_path = state.clone();
        }
        Ok(config)
    }

    /// Load configuration, initialise logging and run the command
    pub async fn run(self) -> Result<()> {
        let config = self.load_config().await?;
        init_tracing(&config.logging, self.verbose);

        let runtime = Runtime::new(&config)?;
        commands::execute(self.command, &runtime, self.config, self.output).await
    }
}
