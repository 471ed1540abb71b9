//! Robot arm trait
//!
//! High-level motions the recipe asks of the robot. Each call is one
//! complete request: it returns only after the robot has finished the
//! motion (or the request failed).

use griddle_protocol::Pose;

use crate::actuator::ActuatorError;

/// Result of a keep-alive refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Session answered normally
    Alive,
    /// Session had been dropped and was reopened
    Reconnected,
}

/// The robot, as seen by step actions
pub trait RobotArm {
    /// Move to the home position
    fn home(&mut self) -> Result<(), ActuatorError>;

    /// Move to the camera position
    fn photo(&mut self) -> Result<(), ActuatorError>;

    /// Move to a pose
    fn move_to(&mut self, pose: Pose) -> Result<(), ActuatorError>;

    /// Position the IR thermometer over a pose
    fn measure_temperature_at(&mut self, pose: Pose) -> Result<(), ActuatorError>;

    /// Flip the item at a pose
    fn flip(&mut self, pose: Pose) -> Result<(), ActuatorError>;

    /// Pick up the item at a pose and drop it on the conveyor
    fn deposit(&mut self, pose: Pose) -> Result<(), ActuatorError>;

    /// Stop the robot immediately, bypassing the claim protocol
    fn emergency_stop(&mut self) -> Result<(), ActuatorError>;

    /// Keep the session alive during long idle stretches
    fn refresh(&mut self) -> Result<RefreshOutcome, ActuatorError>;
}
