//! Failover control
//!
//! [`FailoverController`] is the state machine that owns [`DeploymentState`].
//! It is driven by [`ControlEvent`]s and answers with [`ControlAction`]s; it
//! performs no I/O itself. [`Supervisor`] is the control loop around it: it
//! runs the probe loops and the cost ticker, feeds their results through a
//! bounded queue, executes the actions and persists every transition.

pub mod controller;
pub mod events;
pub mod state;
pub mod supervisor;

#[cfg(test)]
mod tests;

pub use controller::FailoverController;
pub use events::{ControlAction, ControlEvent, OperatorCommand};
pub use state::{DeploymentPhase, DeploymentState, FailoverEpisode, HistoryEntry, TransitionReason};
pub use supervisor::{Supervisor, SupervisorHandle};
