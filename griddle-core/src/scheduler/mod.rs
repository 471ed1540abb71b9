//! Task scheduler
//!
//! Tracks every item on the hotplate as a [`CookingTask`] and advances
//! them one tick at a time from the control loop.
//!
//! [`CookingTask`]: crate::recipe::CookingTask

pub mod registry;

pub use registry::TaskRegistry;
