//! Collaborator traits
//!
//! These traits define the interface between the scheduling/actuation logic
//! and the things it drives: the robot's register bank, the robot itself,
//! the mezzanine hardware, the vision detector and the passage of time.

pub mod bus;
pub mod clock;
pub mod detector;
pub mod hardware;
pub mod robot;

pub use bus::{BusError, RegisterBus};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use detector::{Coordinate, Detector};
pub use hardware::{Button, ConveyorDirection, HardwareError, HardwareIo};
pub use robot::{RefreshOutcome, RobotArm};
