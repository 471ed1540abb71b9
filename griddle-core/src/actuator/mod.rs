//! Robot actuation protocol
//!
//! Every robot motion goes through [`ActuatorLink`], which serializes host
//! writes against the robot program's own register reads with a busy-flag
//! handshake:
//!
//! ```text
//! claim:    read BUSY until 0 (sleep after every read), write BUSY = 1
//! dispatch: write TARGET_POSE[0..3], write COMMAND
//! release:  write BUSY = 0
//! await:    repeat { claim, read COMMAND, release } until COMMAND == 0
//! ```
//!
//! The busy flag is a cooperative lock with the robot's firmware loop, not
//! a general-purpose mutex: the read-then-write claim is not atomic and is
//! only safe with a single host-side caller.

pub mod error;
pub mod link;

pub use error::ActuatorError;
pub use link::{ActuatorLink, LinkConfig, LinkState, RequestPhase};
