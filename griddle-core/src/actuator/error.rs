//! Actuator error types

use std::time::Duration;

use thiserror::Error;

use crate::traits::BusError;

/// Failures of a robot request
///
/// Each variant names the protocol stage that failed and carries the bus
/// error that caused it.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// Session could not be opened or reopened
    #[error("robot connection failed: {0}")]
    Connection(#[source] BusError),

    /// Reading the busy flag failed while claiming
    #[error("claim: reading busy flag failed: {0}")]
    ClaimReadFailed(#[source] BusError),

    /// Setting the busy flag failed after it read free
    #[error("claim: setting busy flag failed: {0}")]
    ClaimWriteFailed(#[source] BusError),

    /// Clearing the busy flag failed
    #[error("release: clearing busy flag failed: {0}")]
    ReleaseFailed(#[source] BusError),

    /// Writing the target pose or command failed
    #[error("register write failed: {0}")]
    WriteFailed(#[source] BusError),

    /// Reading the current pose or command failed
    #[error("register read failed: {0}")]
    ReadFailed(#[source] BusError),

    /// The robot did not clear the command register in time
    #[error("robot did not finish the command within {0:?}")]
    CompletionTimeout(Duration),
}

impl ActuatorError {
    /// Numeric status code, as shown in operation logs
    pub fn code(&self) -> i32 {
        match self {
            ActuatorError::ReadFailed(_) => -1,
            ActuatorError::WriteFailed(_) => -2,
            ActuatorError::Connection(_) => -4,
            ActuatorError::ClaimReadFailed(_) => -5,
            ActuatorError::ClaimWriteFailed(_) => -6,
            ActuatorError::ReleaseFailed(_) => -7,
            ActuatorError::CompletionTimeout(_) => -8,
        }
    }
}
