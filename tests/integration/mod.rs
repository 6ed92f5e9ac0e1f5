//! Integration tests for failover-rs
//!
//! These tests run the real control loop against in-process providers on a
//! paused clock, and the HTTP integration against a mock server.

pub mod config_tests;
pub mod persistence_tests;
pub mod supervisor_tests;

use failover_rs::core::failover::DeploymentState;
use failover_rs::{OperatorCommand, Runtime, SupervisorHandle};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A control loop running in the background
pub struct Running {
    pub handle: SupervisorHandle,
    pub stop: Option<oneshot::Sender<()>>,
    pub task: JoinHandle<failover_rs::Result<DeploymentState>>,
}

impl Running {
    /// Request a deploy and start the loop
    pub async fn deploy(runtime: &Runtime) -> Self {
        let mut supervisor = runtime.supervisor();
        supervisor.command(OperatorCommand::Deploy).await.unwrap();
        Self::spawn(supervisor)
    }

    pub fn spawn(supervisor: failover_rs::Supervisor) -> Self {
        let handle = supervisor.handle();
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(supervisor.run(async move {
            let _ = stopped.await;
        }));
        Self {
            handle,
            stop: Some(stop),
            task,
        }
    }

    /// Poll the published state once per second until `done` holds
    pub async fn until<F>(&self, limit: Duration, done: F) -> DeploymentState
    where
        F: Fn(&DeploymentState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            let state = self.handle.state();
            if done(&state) {
                return state;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached within {:?}; last state: {:?}",
                limit,
                state
            );
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// Stop the loop via its shutdown future
    pub async fn shutdown(mut self) -> failover_rs::Result<DeploymentState> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await.unwrap()
    }
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
