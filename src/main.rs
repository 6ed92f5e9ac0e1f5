//! failover - provider redundancy and failover controller
//!
//! Keeps one workload running on the best viable compute provider and moves
//! it when that provider becomes unhealthy or too expensive.

#![allow(missing_docs)]

use anyhow::Context;
use clap::Parser;
use failover_rs::FailoverError;
use failover_rs::cli::Cli;
use failover_rs::cli::output::print_error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.name();
    cli.run()
        .await
        .with_context(|| format!("failover {} failed", command))
}

fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<FailoverError>()
        .map(FailoverError::exit_code)
        .unwrap_or(1)
}
